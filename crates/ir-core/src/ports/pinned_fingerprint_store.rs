use async_trait::async_trait;
use thiserror::Error;

use crate::ids::DeviceId;

#[derive(Debug, Error)]
pub enum PinnedFingerprintStoreError {
    #[error("pinned fingerprint store failed: {0}")]
    Store(String),
}

/// Persistence for per-device pinned certificate fingerprints.
///
/// Fingerprints are stored in canonical colon-hex form.
#[async_trait]
pub trait PinnedFingerprintStorePort: Send + Sync {
    async fn load(&self, device_id: &DeviceId)
        -> Result<Option<String>, PinnedFingerprintStoreError>;

    /// Overwrites any previous value.
    async fn save(
        &self,
        device_id: &DeviceId,
        fingerprint: &str,
    ) -> Result<(), PinnedFingerprintStoreError>;

    /// Idempotent.
    async fn delete(&self, device_id: &DeviceId) -> Result<(), PinnedFingerprintStoreError>;
}
