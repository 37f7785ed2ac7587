use thiserror::Error;

use ir_core::crypto::{FingerprintError, PinPolicyError};

/// Configuration-time failures. Raised synchronously, before any handshake.
#[derive(Debug, Error)]
pub enum TlsConfigError {
    #[error("Certificate data is empty")]
    EmptyCertificate,

    #[error("Private key data is empty")]
    EmptyPrivateKey,

    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("Malformed private key: {0}")]
    MalformedPrivateKey(String),

    #[error("Unsupported private key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    #[error("Expected fingerprint must not be blank")]
    BlankFingerprint,

    #[error("Invalid expected fingerprint: {0}")]
    InvalidFingerprint(#[from] FingerprintError),

    #[error("Pinned host must not be blank")]
    BlankHost,

    #[error("Invalid pin policy: {0}")]
    PinPolicy(PinPolicyError),

    #[error("rustls rejected the configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

impl From<PinPolicyError> for TlsConfigError {
    fn from(e: PinPolicyError) -> Self {
        match e {
            PinPolicyError::BlankHost => TlsConfigError::BlankHost,
            other => TlsConfigError::PinPolicy(other),
        }
    }
}

/// Handshake-time trust failures of the pinning verifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrustError {
    #[error("Peer presented no certificate")]
    EmptyChain,

    #[error("Certificate fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },
}

impl From<TrustError> for rustls::Error {
    fn from(_: TrustError) -> Self {
        rustls::Error::InvalidCertificate(rustls::CertificateError::ApplicationVerificationFailure)
    }
}
