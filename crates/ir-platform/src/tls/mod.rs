//! rustls-backed TLS for the sync transport.
//!
//! ```text
//! CertificateData (PEM) ──create_credential──▶ CredentialBundle
//!                                                  │
//!                                build_server_context ──▶ Arc<ServerConfig>
//!
//! expected fingerprint ──build_client_context──▶ Arc<ClientConfig> (PinnedCertVerifier)
//! ```

mod context;
mod credential;
mod error;
mod verifier;

pub use context::{supported_protocol_versions, RustlsContextFactory};
pub use credential::{create_credential, CredentialBundle};
pub use error::{TlsConfigError, TrustError};
pub use verifier::PinnedCertVerifier;
