//! Peer discovery over DNS-SD.

mod error;
mod listeners;
mod reachability;
mod service;
mod settings;

#[cfg(test)]
pub(crate) mod stub_port;
#[cfg(test)]
mod service_test;

pub use error::DiscoveryError;
pub use reachability::TcpReachabilityProbe;
pub use service::DiscoveryService;
pub use settings::DiscoverySettings;
