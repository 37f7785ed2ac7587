use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use ir_core::ports::{CertificateServiceError, CertificateServicePort};
use ir_core::CertificateData;

const CERT_DIR: &str = "certs";
const CERT_EXT: &str = "crt.pem";
const KEY_EXT: &str = "key.pem";

/// Generate a self-signed certificate with a fresh key pair.
///
/// `subject_names` become SAN entries; peers pin the fingerprint, so the
/// names only matter for diagnostics.
pub fn generate_self_signed(
    subject_names: Vec<String>,
) -> Result<CertificateData, CertificateServiceError> {
    let certified = rcgen::generate_simple_self_signed(subject_names)
        .map_err(|e| CertificateServiceError::Generation(e.to_string()))?;

    Ok(CertificateData::new(
        certified.cert.pem().into_bytes(),
        certified.key_pair.serialize_pem().into_bytes(),
    ))
}

/// Certificate service that creates a self-signed certificate per alias on
/// first use.
///
/// 按别名生成自签名证书；配置了目录时持久化到磁盘，重启后指纹保持不变。
pub struct SelfSignedCertificateService {
    subject_names: Vec<String>,
    dir: Option<PathBuf>,
    cache: Mutex<HashMap<String, CertificateData>>,
}

impl SelfSignedCertificateService {
    /// Memory-only: a new certificate every process start.
    pub fn in_memory(subject_names: Vec<String>) -> Self {
        Self {
            subject_names,
            dir: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Persist under `<app_data_root>/certs`.
    pub fn persistent(app_data_root: &Path, subject_names: Vec<String>) -> Self {
        Self {
            subject_names,
            dir: Some(app_data_root.join(CERT_DIR)),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn paths(dir: &Path, alias: &str) -> (PathBuf, PathBuf) {
        (
            dir.join(format!("{alias}.{CERT_EXT}")),
            dir.join(format!("{alias}.{KEY_EXT}")),
        )
    }

    fn read_from_disk(
        dir: &Path,
        alias: &str,
    ) -> Result<Option<CertificateData>, CertificateServiceError> {
        let (cert_path, key_path) = Self::paths(dir, alias);
        let certificate = match std::fs::read(&cert_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(CertificateServiceError::Unavailable(format!(
                    "failed to read certificate file: {err}"
                )))
            }
        };
        let private_key = match std::fs::read(&key_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(CertificateServiceError::Unavailable(format!(
                    "failed to read private key file: {err}"
                )))
            }
        };
        Ok(Some(CertificateData::new(certificate, private_key)))
    }

    fn write_to_disk(
        dir: &Path,
        alias: &str,
        data: &CertificateData,
    ) -> Result<(), CertificateServiceError> {
        std::fs::create_dir_all(dir).map_err(|err| {
            CertificateServiceError::Unavailable(format!("failed to create cert dir: {err}"))
        })?;

        let (cert_path, key_path) = Self::paths(dir, alias);
        for (path, bytes) in [(&key_path, &data.private_key), (&cert_path, &data.certificate)] {
            let tmp_path = path.with_extension("tmp");
            std::fs::write(&tmp_path, bytes).map_err(|err| {
                CertificateServiceError::Unavailable(format!("failed to write temp file: {err}"))
            })?;
            std::fs::rename(&tmp_path, path).map_err(|err| {
                CertificateServiceError::Unavailable(format!("failed to commit file: {err}"))
            })?;
        }
        Ok(())
    }

    fn load_or_create(&self, alias: &str) -> Result<CertificateData, CertificateServiceError> {
        if let Some(dir) = &self.dir {
            if let Some(data) = Self::read_from_disk(dir, alias)? {
                debug!(alias, "Loaded certificate from disk");
                return Ok(data);
            }
        }

        let data = generate_self_signed(self.subject_names.clone())?;
        if let Some(dir) = &self.dir {
            Self::write_to_disk(dir, alias, &data)?;
        }
        info!(alias, persisted = self.dir.is_some(), "Generated self-signed certificate");
        Ok(data)
    }
}

#[async_trait]
impl CertificateServicePort for SelfSignedCertificateService {
    async fn certificate(&self, alias: &str) -> Result<CertificateData, CertificateServiceError> {
        if alias.trim().is_empty() {
            return Err(CertificateServiceError::Unavailable(
                "alias must not be blank".to_string(),
            ));
        }

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| CertificateServiceError::Unavailable("cache poisoned".to_string()))?;
        if let Some(data) = cache.get(alias) {
            return Ok(data.clone());
        }

        let data = self.load_or_create(alias)?;
        cache.insert(alias.to_string(), data.clone());
        Ok(data)
    }
}
