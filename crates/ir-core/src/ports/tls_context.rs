use crate::security::{CertificateData, TlsProtocolVersion};

/// Builds TLS contexts for the sync transport.
///
/// Contexts are opaque to the core; the adapter decides the TLS library.
/// Server contexts present the local credential; client contexts trust a
/// peer only if its leaf certificate matches the expected fingerprint.
pub trait TlsContextFactoryPort: Send + Sync {
    type Credential: Send + Sync;
    type ServerContext: Send + Sync;
    type ClientContext: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    fn create_credential(&self, data: &CertificateData) -> Result<Self::Credential, Self::Error>;

    fn build_server_context(
        &self,
        credential: &Self::Credential,
    ) -> Result<Self::ServerContext, Self::Error>;

    /// `expected_fingerprint` is colon-hex SHA-256; a blank value is an error.
    fn build_client_context(
        &self,
        expected_fingerprint: &str,
    ) -> Result<Self::ClientContext, Self::Error>;

    fn supported_protocol_versions(&self) -> &'static [TlsProtocolVersion];
}
