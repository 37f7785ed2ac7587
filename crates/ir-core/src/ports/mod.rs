//! Port interfaces for the application layer
//!
//! Ports are the capabilities the LAN sync services depend on and the
//! platform layer implements:
//!
//! | Port | Implemented by |
//! |---|---|
//! | [`ServiceDiscoveryPort`] | DNS-SD / mDNS adapter |
//! | [`ReachabilityPort`] | TCP probe (optionally interface-bound) |
//! | [`NetworkBindingPort`] | interface enumeration + socket binding |
//! | [`TlsContextFactoryPort`] | rustls context factory |
//! | [`CertificateServicePort`] | host application / self-signed generator |
//! | [`PinnedFingerprintStorePort`] | host application / in-memory store |

pub mod certificate_service;
pub mod network_binding;
pub mod pinned_fingerprint_store;
pub mod reachability;
pub mod service_discovery;
pub mod tls_context;

pub use certificate_service::{CertificateServiceError, CertificateServicePort};
pub use network_binding::{NetworkBindingError, NetworkBindingPort};
pub use pinned_fingerprint_store::{PinnedFingerprintStoreError, PinnedFingerprintStorePort};
pub use reachability::ReachabilityPort;
pub use service_discovery::{
    DiscoveryHandle, DiscoveryListener, RegistrationHandle, RegistrationListener, ResolveListener,
    ResolvedService, ServiceAdvertisement, ServiceDiscoveryError, ServiceDiscoveryPort,
    ServiceRegistration,
};
pub use tls_context::TlsContextFactoryPort;
