use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::fmt;
use tracing::debug;

use ir_core::crypto::CertificateFingerprint;
use ir_core::security::CREDENTIAL_ALIAS;
use ir_core::CertificateData;

use super::error::TlsConfigError;

/// Parsed certificate chain and private key, ready for a rustls config.
pub struct CredentialBundle {
    alias: String,
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    fingerprint: CertificateFingerprint,
}

impl CredentialBundle {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    /// End-entity certificate. Always present.
    pub fn leaf(&self) -> &CertificateDer<'static> {
        &self.chain[0]
    }

    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        self.key.clone_key()
    }

    /// SHA-256 of the leaf certificate; the value peers pin.
    pub fn fingerprint(&self) -> &CertificateFingerprint {
        &self.fingerprint
    }
}

impl Clone for CredentialBundle {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            chain: self.chain.clone(),
            key: self.key.clone_key(),
            fingerprint: self.fingerprint,
        }
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("alias", &self.alias)
            .field("chain_len", &self.chain.len())
            .field("fingerprint", &self.fingerprint.to_colon_hex())
            .finish_non_exhaustive()
    }
}

/// Parse PEM certificate + PKCS#8 key into a credential bound under the
/// sync alias.
pub fn create_credential(data: &CertificateData) -> Result<CredentialBundle, TlsConfigError> {
    if data.certificate.is_empty() {
        return Err(TlsConfigError::EmptyCertificate);
    }
    if data.private_key.is_empty() {
        return Err(TlsConfigError::EmptyPrivateKey);
    }

    let chain: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(&data.certificate)
        .collect::<Result<_, _>>()
        .map_err(|e| TlsConfigError::MalformedCertificate(e.to_string()))?;
    let leaf = chain.first().ok_or_else(|| {
        TlsConfigError::MalformedCertificate("no CERTIFICATE block found".to_string())
    })?;

    // The PEM wrapper says nothing about the DER inside.
    x509_parser::parse_x509_certificate(leaf.as_ref())
        .map_err(|e| TlsConfigError::MalformedCertificate(e.to_string()))?;

    let key = PrivatePkcs8KeyDer::from_pem_slice(&data.private_key)
        .map_err(|e| TlsConfigError::MalformedPrivateKey(e.to_string()))?;
    let key = PrivateKeyDer::Pkcs8(key);

    rustls::crypto::ring::sign::any_supported_type(&key)
        .map_err(|e| TlsConfigError::UnsupportedKeyAlgorithm(e.to_string()))?;

    let fingerprint = CertificateFingerprint::from_der(leaf.as_ref());
    debug!(alias = CREDENTIAL_ALIAS, fingerprint = %fingerprint, "Created TLS credential");

    Ok(CredentialBundle {
        alias: CREDENTIAL_ALIAS.to_string(),
        chain,
        key,
        fingerprint,
    })
}
