//! Cryptographic utilities
//!
//! - **Certificate fingerprint**: SHA-256 of a DER certificate, colon-hex and pin forms
//! - **Certificate pinner**: host-scoped pin policy used by pinned TLS clients

pub mod cert_fingerprint;
pub mod pinner;

pub use cert_fingerprint::{
    from_pinning_format, sha256_fingerprint, to_pinning_format, CertificateFingerprint,
    FingerprintError, FINGERPRINT_LEN, PIN_PREFIX,
};
pub use pinner::{CertificatePinner, CertificatePinnerBuilder, PinPolicyError};
