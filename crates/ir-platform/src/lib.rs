//! # ir-platform
//!
//! Platform adapters for IReader LAN sync.
//!
//! - `mdns`: [`ServiceDiscoveryPort`](ir_core::ports::ServiceDiscoveryPort) over `mdns-sd`
//! - `network`: interface enumeration and interface-bound TCP sockets
//! - `tls`: rustls credential, context factory and pinning verifier
//! - `certificate`, `pinning`: local certificate supply and pin persistence

pub mod certificate;
pub mod mdns;
pub mod network;
pub mod pinning;
pub mod tls;
pub mod transport;

pub use certificate::SelfSignedCertificateService;
pub use mdns::MdnsServiceDiscovery;
pub use network::{BoundSocketConnector, SocketBindingNetworkAdapter};
pub use pinning::{FilePinnedFingerprintStore, InMemoryPinnedFingerprintStore};
pub use tls::{RustlsContextFactory, TlsConfigError};
pub use transport::TransportTlsBinding;
