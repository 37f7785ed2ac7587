//! DNS-SD capability, callback style.
//!
//! Platform service-discovery stacks report progress asynchronously through
//! listeners. The port keeps that shape so the application layer decides how
//! to bridge callbacks into futures. Implementations may invoke listeners
//! from any thread, including synchronously from inside the call that
//! registered them.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceDiscoveryError {
    #[error("service registration failed: {0}")]
    Registration(String),

    #[error("service discovery failed: {0}")]
    Discovery(String),

    #[error("service resolution failed: {0}")]
    Resolve(String),

    #[error("service discovery platform error: {0}")]
    Platform(String),
}

/// Identifies an active registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle(pub u64);

/// Identifies an active discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscoveryHandle(pub u64);

/// A service instance to advertise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    pub service_type: String,
    pub instance_name: String,
    pub port: u16,
    pub attributes: HashMap<String, String>,
}

/// A service instance seen on the network, before resolution.
///
/// `attributes` may be empty when the platform only knows the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAdvertisement {
    pub service_type: String,
    pub instance_name: String,
    pub attributes: HashMap<String, String>,
}

/// A resolved service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub instance_name: String,
    pub host: Option<IpAddr>,
    pub port: u16,
    pub attributes: HashMap<String, String>,
}

pub trait RegistrationListener: Send + Sync {
    fn on_registered(&self, instance_name: &str);
    fn on_registration_failed(&self, error: ServiceDiscoveryError);
}

pub trait DiscoveryListener: Send + Sync {
    fn on_discovery_started(&self, service_type: &str);
    fn on_start_discovery_failed(&self, error: ServiceDiscoveryError);
    fn on_service_found(&self, service: ServiceAdvertisement);
    fn on_service_lost(&self, service: ServiceAdvertisement);
}

pub trait ResolveListener: Send + Sync {
    fn on_resolved(&self, service: ResolvedService);
    fn on_resolve_failed(&self, service: ServiceAdvertisement, error: ServiceDiscoveryError);
}

pub trait ServiceDiscoveryPort: Send + Sync {
    /// Begin advertising. Outcome is reported to `listener`; an `Err` here
    /// means the platform rejected the request outright.
    fn register_service(
        &self,
        registration: ServiceRegistration,
        listener: Arc<dyn RegistrationListener>,
    ) -> Result<RegistrationHandle, ServiceDiscoveryError>;

    /// Withdraw an advertisement. Unknown handles are ignored.
    fn unregister_service(&self, handle: RegistrationHandle);

    fn discover_services(
        &self,
        service_type: &str,
        listener: Arc<dyn DiscoveryListener>,
    ) -> Result<DiscoveryHandle, ServiceDiscoveryError>;

    /// Stop a discovery session. Unknown handles are ignored.
    fn stop_service_discovery(&self, handle: DiscoveryHandle);

    fn resolve_service(&self, service: ServiceAdvertisement, listener: Arc<dyn ResolveListener>);
}
