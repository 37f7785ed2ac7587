use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use ir_core::crypto::{CertificateFingerprint, FingerprintError};
use ir_core::ports::{PinnedFingerprintStoreError, PinnedFingerprintStorePort};
use ir_core::DeviceId;

#[derive(Debug, Error)]
pub enum PinningError {
    #[error("Device id must not be empty")]
    EmptyDeviceId,

    #[error("Fingerprint must not be empty")]
    EmptyFingerprint,

    #[error("Certificate must not be empty")]
    EmptyCertificate,

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(#[from] FingerprintError),

    #[error("No certificate pinned for device {0}")]
    DeviceNotPinned(DeviceId),

    #[error(transparent)]
    Store(#[from] PinnedFingerprintStoreError),
}

/// Trust-on-first-use pins for paired peers.
///
/// Fingerprints are normalized to canonical colon-hex before storing, so a
/// pin written in lowercase still matches.
pub struct CertificatePinningManager {
    store: Arc<dyn PinnedFingerprintStorePort>,
}

impl CertificatePinningManager {
    pub fn new(store: Arc<dyn PinnedFingerprintStorePort>) -> Self {
        Self { store }
    }

    pub async fn pin_certificate(
        &self,
        device_id: &DeviceId,
        fingerprint: &str,
    ) -> Result<(), PinningError> {
        ensure_device_id(device_id)?;
        let fingerprint = normalize(fingerprint)?;
        self.store.save(device_id, &fingerprint).await?;
        info!(device_id = %device_id, "Pinned certificate");
        Ok(())
    }

    /// Replace the pin of an already pinned device.
    pub async fn update_pinned_certificate(
        &self,
        device_id: &DeviceId,
        fingerprint: &str,
    ) -> Result<(), PinningError> {
        ensure_device_id(device_id)?;
        let fingerprint = normalize(fingerprint)?;
        if self.store.load(device_id).await?.is_none() {
            return Err(PinningError::DeviceNotPinned(device_id.clone()));
        }
        self.store.save(device_id, &fingerprint).await?;
        info!(device_id = %device_id, "Updated pinned certificate");
        Ok(())
    }

    /// Idempotent.
    pub async fn remove_pinned_certificate(&self, device_id: &DeviceId) -> Result<(), PinningError> {
        ensure_device_id(device_id)?;
        self.store.delete(device_id).await?;
        debug!(device_id = %device_id, "Removed pinned certificate");
        Ok(())
    }

    pub async fn get_pinned_fingerprint(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<String>, PinningError> {
        ensure_device_id(device_id)?;
        Ok(self.store.load(device_id).await?)
    }

    /// Whether the DER certificate matches the device's pin.
    pub async fn validate_certificate(
        &self,
        device_id: &DeviceId,
        certificate_der: &[u8],
    ) -> Result<bool, PinningError> {
        ensure_device_id(device_id)?;
        if certificate_der.is_empty() {
            return Err(PinningError::EmptyCertificate);
        }

        let pinned = self
            .store
            .load(device_id)
            .await?
            .ok_or_else(|| PinningError::DeviceNotPinned(device_id.clone()))?;
        let pinned = CertificateFingerprint::parse_colon_hex(&pinned)?;

        let matches = pinned.matches_der(certificate_der);
        if !matches {
            warn!(device_id = %device_id, "Certificate does not match pinned fingerprint");
        }
        Ok(matches)
    }
}

fn ensure_device_id(device_id: &DeviceId) -> Result<(), PinningError> {
    if device_id.is_empty() {
        return Err(PinningError::EmptyDeviceId);
    }
    Ok(())
}

fn normalize(fingerprint: &str) -> Result<String, PinningError> {
    if fingerprint.trim().is_empty() {
        return Err(PinningError::EmptyFingerprint);
    }
    Ok(CertificateFingerprint::parse_colon_hex(fingerprint)?.to_colon_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ir_core::crypto::sha256_fingerprint;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<DeviceId, String>>);

    #[async_trait]
    impl PinnedFingerprintStorePort for MemoryStore {
        async fn load(
            &self,
            device_id: &DeviceId,
        ) -> Result<Option<String>, PinnedFingerprintStoreError> {
            Ok(self.0.lock().unwrap().get(device_id).cloned())
        }

        async fn save(
            &self,
            device_id: &DeviceId,
            fingerprint: &str,
        ) -> Result<(), PinnedFingerprintStoreError> {
            self.0
                .lock()
                .unwrap()
                .insert(device_id.clone(), fingerprint.to_string());
            Ok(())
        }

        async fn delete(&self, device_id: &DeviceId) -> Result<(), PinnedFingerprintStoreError> {
            self.0.lock().unwrap().remove(device_id);
            Ok(())
        }
    }

    fn manager() -> CertificatePinningManager {
        CertificatePinningManager::new(Arc::new(MemoryStore::default()))
    }

    const CERT: &[u8] = b"device-a-certificate-der";

    #[tokio::test]
    async fn test_pin_and_get() {
        let manager = manager();
        let device = DeviceId::from("device-a");
        let fp = sha256_fingerprint(CERT);

        manager
            .pin_certificate(&device, &fp.to_lowercase())
            .await
            .unwrap();

        assert_eq!(
            manager.get_pinned_fingerprint(&device).await.unwrap(),
            Some(fp)
        );
        assert_eq!(
            manager
                .get_pinned_fingerprint(&DeviceId::from("other"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_pin_rejects_empty_input() {
        let manager = manager();

        assert!(matches!(
            manager.pin_certificate(&DeviceId::from(""), "AA").await,
            Err(PinningError::EmptyDeviceId)
        ));
        assert!(matches!(
            manager.pin_certificate(&DeviceId::from("d"), "  ").await,
            Err(PinningError::EmptyFingerprint)
        ));
        assert!(matches!(
            manager.pin_certificate(&DeviceId::from("d"), "AA:BB").await,
            Err(PinningError::InvalidFingerprint(_))
        ));
    }

    #[tokio::test]
    async fn test_update_requires_existing_pin() {
        let manager = manager();
        let device = DeviceId::from("device-a");
        let new_fp = sha256_fingerprint(b"rotated");

        assert!(matches!(
            manager.update_pinned_certificate(&device, &new_fp).await,
            Err(PinningError::DeviceNotPinned(_))
        ));

        manager
            .pin_certificate(&device, &sha256_fingerprint(CERT))
            .await
            .unwrap();
        manager
            .update_pinned_certificate(&device, &new_fp)
            .await
            .unwrap();

        assert_eq!(
            manager.get_pinned_fingerprint(&device).await.unwrap(),
            Some(new_fp)
        );
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let manager = manager();
        let device = DeviceId::from("device-a");
        manager
            .pin_certificate(&device, &sha256_fingerprint(CERT))
            .await
            .unwrap();

        manager.remove_pinned_certificate(&device).await.unwrap();
        manager.remove_pinned_certificate(&device).await.unwrap();

        assert_eq!(manager.get_pinned_fingerprint(&device).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_validate_certificate() {
        let manager = manager();
        let device = DeviceId::from("device-a");

        assert!(matches!(
            manager.validate_certificate(&device, CERT).await,
            Err(PinningError::DeviceNotPinned(_))
        ));

        manager
            .pin_certificate(&device, &sha256_fingerprint(CERT))
            .await
            .unwrap();

        assert!(manager.validate_certificate(&device, CERT).await.unwrap());
        assert!(!manager
            .validate_certificate(&device, b"impostor")
            .await
            .unwrap());
        assert!(matches!(
            manager.validate_certificate(&device, b"").await,
            Err(PinningError::EmptyCertificate)
        ));
    }
}
