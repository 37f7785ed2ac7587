//! # ir-app
//!
//! Application services for IReader LAN sync. Everything here depends only
//! on `ir-core` ports and is exercised with stub adapters in tests.

pub mod discovery;
pub mod pinning;
pub mod routing;
pub mod usecases;

pub use discovery::{DiscoveryError, DiscoveryService, DiscoverySettings, TcpReachabilityProbe};
pub use pinning::{CertificatePinningManager, PinningError};
pub use routing::{BindingState, NetworkRoutingConfigurator};
pub use usecases::{LanSyncSession, LanSyncStatus, SecureChannelError, SecureChannelFactory};
