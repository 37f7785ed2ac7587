use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use ir_core::ports::{PinnedFingerprintStoreError, PinnedFingerprintStorePort};
use ir_core::DeviceId;

const PINS_FILE: &str = "pinned_fingerprints.json";

/// Pinned fingerprints in a JSON object `{ "<device id>": "<colon-hex>" }`.
///
/// Every write rewrites the whole file through a temp file + rename.
pub struct FilePinnedFingerprintStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePinnedFingerprintStore {
    pub fn new(app_data_root: &Path) -> Self {
        Self {
            path: app_data_root.join(PINS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PinnedFingerprintStoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(PinnedFingerprintStoreError::Store(format!(
                    "failed to read pins file: {err}"
                )))
            }
        };
        serde_json::from_slice(&bytes).map_err(|err| {
            PinnedFingerprintStoreError::Store(format!("failed to parse pins file: {err}"))
        })
    }

    fn write_all(&self, pins: &BTreeMap<String, String>) -> Result<(), PinnedFingerprintStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                PinnedFingerprintStoreError::Store(format!("failed to create pins dir: {err}"))
            })?;
        }
        let bytes = serde_json::to_vec_pretty(pins).map_err(|err| {
            PinnedFingerprintStoreError::Store(format!("failed to encode pins: {err}"))
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, bytes).map_err(|err| {
            PinnedFingerprintStoreError::Store(format!("failed to write pins temp file: {err}"))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|err| {
            PinnedFingerprintStoreError::Store(format!("failed to commit pins file: {err}"))
        })?;
        Ok(())
    }
}

#[async_trait]
impl PinnedFingerprintStorePort for FilePinnedFingerprintStore {
    async fn load(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<String>, PinnedFingerprintStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all()?.remove(device_id.as_str()))
    }

    async fn save(
        &self,
        device_id: &DeviceId,
        fingerprint: &str,
    ) -> Result<(), PinnedFingerprintStoreError> {
        let _guard = self.lock.lock().await;
        let mut pins = self.read_all()?;
        pins.insert(device_id.to_string(), fingerprint.to_string());
        self.write_all(&pins)?;
        debug!(device_id = %device_id, "Saved pinned fingerprint");
        Ok(())
    }

    async fn delete(&self, device_id: &DeviceId) -> Result<(), PinnedFingerprintStoreError> {
        let _guard = self.lock.lock().await;
        let mut pins = self.read_all()?;
        if pins.remove(device_id.as_str()).is_some() {
            self.write_all(&pins)?;
        }
        Ok(())
    }
}
