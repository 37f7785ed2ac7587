//! Glue between stored certificate material and the sync transport's
//! TLS configuration.

use rustls::{ClientConfig, ServerConfig};
use std::sync::Arc;
use tracing::info_span;

use ir_core::CertificateData;

use crate::tls::{RustlsContextFactory, TlsConfigError};

/// Produces the rustls configs the sync socket layer plugs in.
#[derive(Debug, Clone, Default)]
pub struct TransportTlsBinding {
    factory: RustlsContextFactory,
}

impl TransportTlsBinding {
    pub fn new(factory: RustlsContextFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &RustlsContextFactory {
        &self.factory
    }

    /// Server config presenting the local certificate.
    pub fn configure_server_tls(
        &self,
        data: &CertificateData,
    ) -> Result<Arc<ServerConfig>, TlsConfigError> {
        let _span = info_span!("transport.configure_server_tls").entered();
        let credential = crate::tls::create_credential(data)?;
        self.factory.build_server_context(&credential)
    }

    /// Client config trusting only the peer whose leaf hashes to
    /// `expected_fingerprint`.
    pub fn configure_client_tls(
        &self,
        expected_fingerprint: &str,
    ) -> Result<Arc<ClientConfig>, TlsConfigError> {
        let _span = info_span!("transport.configure_client_tls").entered();
        self.factory.build_client_context(expected_fingerprint)
    }
}
