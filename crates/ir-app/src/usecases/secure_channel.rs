use std::sync::Arc;
use thiserror::Error;
use tracing::{info_span, Instrument};

use ir_core::ports::{CertificateServiceError, CertificateServicePort, TlsContextFactoryPort};
use ir_core::security::CREDENTIAL_ALIAS;
use ir_core::DeviceId;

use crate::pinning::{CertificatePinningManager, PinningError};

#[derive(Debug, Error)]
pub enum SecureChannelError {
    #[error("Failed to obtain local certificate: {0}")]
    Certificate(#[from] CertificateServiceError),

    #[error("TLS configuration failed: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No pinned certificate for device {0}")]
    NotPaired(DeviceId),

    #[error(transparent)]
    Pinning(#[from] PinningError),
}

/// Produces TLS contexts for the sync transport: the local server side from
/// the device certificate, client sides from each peer's pinned fingerprint.
pub struct SecureChannelFactory<F: TlsContextFactoryPort> {
    tls: Arc<F>,
    certificates: Arc<dyn CertificateServicePort>,
    pinning: Arc<CertificatePinningManager>,
}

impl<F: TlsContextFactoryPort> SecureChannelFactory<F> {
    pub fn new(
        tls: Arc<F>,
        certificates: Arc<dyn CertificateServicePort>,
        pinning: Arc<CertificatePinningManager>,
    ) -> Self {
        Self {
            tls,
            certificates,
            pinning,
        }
    }

    pub async fn server_context(&self) -> Result<F::ServerContext, SecureChannelError> {
        let span = info_span!("usecase.secure_channel.server_context");

        async {
            let data = self.certificates.certificate(CREDENTIAL_ALIAS).await?;
            let credential = self.tls.create_credential(&data).map_err(tls_error)?;
            self.tls.build_server_context(&credential).map_err(tls_error)
        }
        .instrument(span)
        .await
    }

    /// Client context trusting only `device_id`'s pinned certificate.
    pub async fn client_context_for(
        &self,
        device_id: &DeviceId,
    ) -> Result<F::ClientContext, SecureChannelError> {
        let span = info_span!("usecase.secure_channel.client_context", device_id = %device_id);

        async {
            let fingerprint = self
                .pinning
                .get_pinned_fingerprint(device_id)
                .await?
                .ok_or_else(|| SecureChannelError::NotPaired(device_id.clone()))?;
            self.tls
                .build_client_context(&fingerprint)
                .map_err(tls_error)
        }
        .instrument(span)
        .await
    }
}

fn tls_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> SecureChannelError {
    SecureChannelError::Tls(Box::new(e))
}
