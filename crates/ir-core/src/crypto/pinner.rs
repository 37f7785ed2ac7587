//! Host-scoped certificate pin policy.
//!
//! A pinner maps hosts to the set of `sha256/<base64>` pins that are
//! acceptable for that host's leaf certificate. Hosts are compared
//! case-insensitively; LAN peers are usually addressed by IP literal.

use std::collections::HashMap;
use thiserror::Error;

use super::cert_fingerprint::{CertificateFingerprint, FingerprintError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PinPolicyError {
    #[error("Pinned host must not be blank")]
    BlankHost,

    #[error("Invalid pin for host {host}: {source}")]
    InvalidPin {
        host: String,
        #[source]
        source: FingerprintError,
    },

    #[error("No pins configured for host {0}")]
    UnknownHost(String),

    #[error("Certificate for host {host} does not match any pin (got {actual})")]
    Mismatch { host: String, actual: String },
}

#[derive(Debug, Default)]
pub struct CertificatePinnerBuilder {
    pins: HashMap<String, Vec<CertificateFingerprint>>,
}

impl CertificatePinnerBuilder {
    /// Add a pin in `sha256/<base64>` form for `host`.
    pub fn add(mut self, host: &str, pin: &str) -> Result<Self, PinPolicyError> {
        let host = normalize_host(host)?;
        let fingerprint =
            CertificateFingerprint::from_pin(pin).map_err(|source| PinPolicyError::InvalidPin {
                host: host.clone(),
                source,
            })?;
        self.pins.entry(host).or_default().push(fingerprint);
        Ok(self)
    }

    pub fn build(self) -> CertificatePinner {
        CertificatePinner { pins: self.pins }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CertificatePinner {
    pins: HashMap<String, Vec<CertificateFingerprint>>,
}

impl CertificatePinner {
    pub fn builder() -> CertificatePinnerBuilder {
        CertificatePinnerBuilder::default()
    }

    pub fn pins_for(&self, host: &str) -> &[CertificateFingerprint] {
        self.pins
            .get(&host.trim().to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Accept `leaf_der` for `host` if its SHA-256 equals one of the host's pins.
    pub fn check(&self, host: &str, leaf_der: &[u8]) -> Result<(), PinPolicyError> {
        let host = normalize_host(host)?;
        let pins = self
            .pins
            .get(&host)
            .ok_or_else(|| PinPolicyError::UnknownHost(host.clone()))?;

        let actual = CertificateFingerprint::from_der(leaf_der);
        if pins.contains(&actual) {
            Ok(())
        } else {
            Err(PinPolicyError::Mismatch {
                host,
                actual: actual.to_colon_hex(),
            })
        }
    }
}

fn normalize_host(host: &str) -> Result<String, PinPolicyError> {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return Err(PinPolicyError::BlankHost);
    }
    Ok(trimmed.to_ascii_lowercase())
}
