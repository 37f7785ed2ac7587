//! Certificate fingerprint generation and conversion
//!
//! 证书指纹的生成与表示转换。
//!
//! # Representations / 表示形式
//!
//! ```text
//! DER certificate bytes
//!   -> SHA-256 (32 bytes)
//!        ├── colon-hex:  "AB:CD:01:...:FF"         (95 chars, uppercase, canonical)
//!        └── pin:        "sha256/q83...==="        (base64, pinning primitive form)
//! ```
//!
//! Both forms carry exactly the same 32 bytes, so conversion is lossless in
//! either direction.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Digest length in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Prefix of the pin representation.
pub const PIN_PREFIX: &str = "sha256/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("Invalid fingerprint length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid fingerprint format: {0}")]
    InvalidFormat(String),

    #[error("Invalid pin: {0}")]
    InvalidPin(String),
}

/// SHA-256 fingerprint of a DER-encoded certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CertificateFingerprint([u8; FINGERPRINT_LEN]);

impl CertificateFingerprint {
    /// Hash DER certificate bytes. Deterministic: no salt, no domain separator.
    pub fn from_der(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let bytes: [u8; FINGERPRINT_LEN] =
            bytes
                .try_into()
                .map_err(|_| FingerprintError::InvalidLength {
                    expected: FINGERPRINT_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Parse the colon-hex form. Hex digits are accepted in either case.
    pub fn parse_colon_hex(s: &str) -> Result<Self, FingerprintError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FingerprintError::InvalidFormat(
                "fingerprint is blank".to_string(),
            ));
        }

        let mut bytes = Vec::with_capacity(FINGERPRINT_LEN);
        for pair in trimmed.split(':') {
            if pair.len() != 2 {
                return Err(FingerprintError::InvalidFormat(format!(
                    "expected two hex digits per group, got {pair:?}"
                )));
            }
            let decoded = hex::decode(pair)
                .map_err(|e| FingerprintError::InvalidFormat(format!("{pair:?}: {e}")))?;
            bytes.extend_from_slice(&decoded);
        }

        Self::from_bytes(&bytes)
    }

    /// Parse the `sha256/<base64>` pin form.
    pub fn from_pin(pin: &str) -> Result<Self, FingerprintError> {
        let encoded = pin.trim().strip_prefix(PIN_PREFIX).ok_or_else(|| {
            FingerprintError::InvalidPin(format!("pin must start with {PIN_PREFIX:?}"))
        })?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| FingerprintError::InvalidPin(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Canonical `AA:BB:...` uppercase form.
    pub fn to_colon_hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }

    pub fn to_pin(&self) -> String {
        format!("{PIN_PREFIX}{}", STANDARD.encode(self.0))
    }

    /// Whether `der` hashes to this fingerprint.
    pub fn matches_der(&self, der: &[u8]) -> bool {
        Self::from_der(der) == *self
    }
}

impl fmt::Display for CertificateFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_colon_hex())
    }
}

impl FromStr for CertificateFingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_colon_hex(s)
    }
}

/// SHA-256 fingerprint of `der` in canonical colon-hex form.
pub fn sha256_fingerprint(der: &[u8]) -> String {
    CertificateFingerprint::from_der(der).to_colon_hex()
}

/// Convert a colon-hex fingerprint to the pin form.
pub fn to_pinning_format(colon_hex: &str) -> Result<String, FingerprintError> {
    Ok(CertificateFingerprint::parse_colon_hex(colon_hex)?.to_pin())
}

/// Convert a pin back to the canonical colon-hex fingerprint.
pub fn from_pinning_format(pin: &str) -> Result<String, FingerprintError> {
    Ok(CertificateFingerprint::from_pin(pin)?.to_colon_hex())
}
