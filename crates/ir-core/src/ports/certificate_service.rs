use async_trait::async_trait;
use thiserror::Error;

use crate::security::CertificateData;

#[derive(Debug, Error)]
pub enum CertificateServiceError {
    #[error("certificate generation failed: {0}")]
    Generation(String),

    #[error("certificate unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the local device's certificate and key.
#[async_trait]
pub trait CertificateServicePort: Send + Sync {
    /// Certificate for `alias`, created on first use.
    async fn certificate(&self, alias: &str) -> Result<CertificateData, CertificateServiceError>;
}
