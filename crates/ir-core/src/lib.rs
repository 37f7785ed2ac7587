//! # ir-core
//!
//! Core domain models and ports for IReader LAN sync.
//!
//! This crate contains pure logic without any platform dependencies: device
//! models, the discovery registry and advertisement codec, certificate
//! fingerprints and pins, network candidate selection, configuration DTOs,
//! and the capability ports implemented by `ir-platform`.

pub mod config;
pub mod crypto;
pub mod device;
pub mod discovery;
pub mod ids;
pub mod network;
pub mod ports;
pub mod security;

// Re-export commonly used types at the crate root
pub use config::SyncConfig;
pub use crypto::{CertificateFingerprint, CertificatePinner};
pub use device::{DeviceInfo, DeviceType, DiscoveredDevice};
pub use discovery::DiscoveryRegistry;
pub use ids::DeviceId;
pub use network::{NetworkCandidate, Transport};
pub use security::{CertificateData, TlsProtocolVersion};
