use rustls::crypto::CryptoProvider;
use rustls::server::WebPkiClientVerifier;
use rustls::{ClientConfig, RootCertStore, ServerConfig, SupportedProtocolVersion};
use std::sync::Arc;
use tracing::{debug, info};

use ir_core::crypto::{CertificateFingerprint, CertificatePinner};
use ir_core::ports::TlsContextFactoryPort;
use ir_core::security::{TlsProtocolVersion, SUPPORTED_TLS_VERSIONS};
use ir_core::CertificateData;

use super::credential::{create_credential, CredentialBundle};
use super::error::TlsConfigError;
use super::verifier::PinnedCertVerifier;

static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// TLS versions negotiated by every context this factory builds.
pub fn supported_protocol_versions() -> &'static [TlsProtocolVersion] {
    &SUPPORTED_TLS_VERSIONS
}

/// rustls context factory (ring provider).
///
/// 服务端出示本机证书；客户端只信任与预期指纹一致的对端证书。
#[derive(Debug, Clone)]
pub struct RustlsContextFactory {
    provider: Arc<CryptoProvider>,
}

impl Default for RustlsContextFactory {
    fn default() -> Self {
        Self::new(Arc::new(rustls::crypto::ring::default_provider()))
    }
}

impl RustlsContextFactory {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    /// Server config presenting `credential`.
    ///
    /// Anonymous clients are accepted. A client that does present a
    /// certificate must chain to our own leaf.
    pub fn build_server_context(
        &self,
        credential: &CredentialBundle,
    ) -> Result<Arc<ServerConfig>, TlsConfigError> {
        let mut roots = RootCertStore::empty();
        roots.add(credential.leaf().clone())?;

        let client_verifier =
            WebPkiClientVerifier::builder_with_provider(Arc::new(roots), self.provider.clone())
                .allow_unauthenticated()
                .build()
                .map_err(|e| TlsConfigError::Rustls(rustls::Error::General(e.to_string())))?;

        let config = ServerConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(PROTOCOL_VERSIONS)?
            .with_client_cert_verifier(client_verifier)
            .with_single_cert(
                credential.certificate_chain().to_vec(),
                credential.private_key(),
            )?;

        info!(
            alias = credential.alias(),
            fingerprint = %credential.fingerprint(),
            "Built TLS server context"
        );
        Ok(Arc::new(config))
    }

    /// Client config that trusts only the leaf whose SHA-256 is
    /// `expected_fingerprint` (colon-hex, any case).
    pub fn build_client_context(
        &self,
        expected_fingerprint: &str,
    ) -> Result<Arc<ClientConfig>, TlsConfigError> {
        if expected_fingerprint.trim().is_empty() {
            return Err(TlsConfigError::BlankFingerprint);
        }
        let expected = CertificateFingerprint::parse_colon_hex(expected_fingerprint)?;
        let verifier = PinnedCertVerifier::new(expected, self.provider.clone());

        debug!(fingerprint = %expected, "Building pinned TLS client context");
        self.client_config(verifier)
    }

    /// Like [`Self::build_client_context`], but the pin only holds for `host`.
    pub fn build_client_context_for_host(
        &self,
        host: &str,
        expected_fingerprint: &str,
    ) -> Result<Arc<ClientConfig>, TlsConfigError> {
        if host.trim().is_empty() {
            return Err(TlsConfigError::BlankHost);
        }
        if expected_fingerprint.trim().is_empty() {
            return Err(TlsConfigError::BlankFingerprint);
        }
        let expected = CertificateFingerprint::parse_colon_hex(expected_fingerprint)?;
        let pinner = CertificatePinner::builder()
            .add(host, &expected.to_pin())?
            .build();

        debug!(host, fingerprint = %expected, "Building host-pinned TLS client context");
        self.build_client_context_with_pinner(pinner)
    }

    pub fn build_client_context_with_pinner(
        &self,
        pinner: CertificatePinner,
    ) -> Result<Arc<ClientConfig>, TlsConfigError> {
        self.client_config(PinnedCertVerifier::for_hosts(pinner, self.provider.clone()))
    }

    fn client_config(
        &self,
        verifier: PinnedCertVerifier,
    ) -> Result<Arc<ClientConfig>, TlsConfigError> {
        let config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(PROTOCOL_VERSIONS)?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();
        Ok(Arc::new(config))
    }
}

impl TlsContextFactoryPort for RustlsContextFactory {
    type Credential = CredentialBundle;
    type ServerContext = Arc<ServerConfig>;
    type ClientContext = Arc<ClientConfig>;
    type Error = TlsConfigError;

    fn create_credential(&self, data: &CertificateData) -> Result<CredentialBundle, TlsConfigError> {
        create_credential(data)
    }

    fn build_server_context(
        &self,
        credential: &CredentialBundle,
    ) -> Result<Arc<ServerConfig>, TlsConfigError> {
        RustlsContextFactory::build_server_context(self, credential)
    }

    fn build_client_context(
        &self,
        expected_fingerprint: &str,
    ) -> Result<Arc<ClientConfig>, TlsConfigError> {
        RustlsContextFactory::build_client_context(self, expected_fingerprint)
    }

    fn supported_protocol_versions(&self) -> &'static [TlsProtocolVersion] {
        supported_protocol_versions()
    }
}
