use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TlsProtocolVersion {
    #[serde(rename = "TLSv1.2")]
    Tls12,
    #[serde(rename = "TLSv1.3")]
    Tls13,
}

/// Versions every LAN sync endpoint negotiates. Nothing older is enabled.
pub const SUPPORTED_TLS_VERSIONS: [TlsProtocolVersion; 2] =
    [TlsProtocolVersion::Tls12, TlsProtocolVersion::Tls13];

impl TlsProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsProtocolVersion::Tls12 => "TLSv1.2",
            TlsProtocolVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl fmt::Display for TlsProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
