use std::fmt;

/// Alias under which the sync credential is requested and bound.
pub const CREDENTIAL_ALIAS: &str = "ireader-sync";

/// PEM X.509 certificate plus its PEM PKCS#8 private key.
///
/// Supplied by a `CertificateServicePort`; the core never persists it.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateData {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl CertificateData {
    pub fn new(certificate: impl Into<Vec<u8>>, private_key: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }
}

// Key material must never end up in logs.
impl fmt::Debug for CertificateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateData")
            .field("certificate_len", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
