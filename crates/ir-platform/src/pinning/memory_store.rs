use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use ir_core::ports::{PinnedFingerprintStoreError, PinnedFingerprintStorePort};
use ir_core::DeviceId;

/// In-memory pinned fingerprint store. Pins are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryPinnedFingerprintStore {
    pins: RwLock<HashMap<DeviceId, String>>,
}

impl InMemoryPinnedFingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pins.read().await.len()
    }
}

#[async_trait]
impl PinnedFingerprintStorePort for InMemoryPinnedFingerprintStore {
    async fn load(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<String>, PinnedFingerprintStoreError> {
        Ok(self.pins.read().await.get(device_id).cloned())
    }

    async fn save(
        &self,
        device_id: &DeviceId,
        fingerprint: &str,
    ) -> Result<(), PinnedFingerprintStoreError> {
        self.pins
            .write()
            .await
            .insert(device_id.clone(), fingerprint.to_string());
        Ok(())
    }

    async fn delete(&self, device_id: &DeviceId) -> Result<(), PinnedFingerprintStoreError> {
        self.pins.write().await.remove(device_id);
        Ok(())
    }
}
