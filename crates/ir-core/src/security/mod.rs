//! Security value types shared between the application and TLS adapters.

pub mod certificate;
pub mod tls_versions;

pub use certificate::{CertificateData, CREDENTIAL_ALIAS};
pub use tls_versions::{TlsProtocolVersion, SUPPORTED_TLS_VERSIONS};
