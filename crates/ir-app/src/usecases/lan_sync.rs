use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

use ir_core::{DeviceInfo, DiscoveredDevice};

use crate::discovery::{DiscoveryError, DiscoveryService};
use crate::routing::NetworkRoutingConfigurator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanSyncStatus {
    /// Sockets are pinned to a WiFi interface.
    pub wifi_bound: bool,
}

/// Brings LAN sync up and down as one unit.
///
/// enable: bind to WiFi (optional) → broadcast → discover.
/// disable: the same steps in reverse.
pub struct LanSyncSession {
    discovery: Arc<DiscoveryService>,
    routing: Arc<NetworkRoutingConfigurator>,
    bind_to_wifi: bool,
}

impl LanSyncSession {
    pub fn new(
        discovery: Arc<DiscoveryService>,
        routing: Arc<NetworkRoutingConfigurator>,
        bind_to_wifi: bool,
    ) -> Self {
        Self {
            discovery,
            routing,
            bind_to_wifi,
        }
    }

    pub async fn enable(&self, local: DeviceInfo) -> Result<LanSyncStatus, DiscoveryError> {
        let span = info_span!("usecase.lan_sync.enable", device_id = %local.device_id);

        async {
            let wifi_bound = self.bind_to_wifi && self.routing.bind_to_wifi_network();
            if self.bind_to_wifi && !wifi_bound {
                warn!("WiFi binding unavailable, continuing on default routing");
            }

            if let Err(e) = self.discovery.start_broadcasting(local).await {
                self.rollback(wifi_bound);
                return Err(e);
            }
            if let Err(e) = self.discovery.start_discovery().await {
                self.discovery.stop_broadcasting();
                self.rollback(wifi_bound);
                return Err(e);
            }

            info!(wifi_bound, "LAN sync enabled");
            Ok(LanSyncStatus { wifi_bound })
        }
        .instrument(span)
        .await
    }

    pub fn disable(&self) {
        let _span = info_span!("usecase.lan_sync.disable").entered();
        self.discovery.stop_discovery();
        self.discovery.stop_broadcasting();
        self.routing.reset_network_binding();
        info!("LAN sync disabled");
    }

    /// Restart discovery after the OS reports a different active network.
    pub async fn on_network_changed(&self) -> Result<(), DiscoveryError> {
        if self.bind_to_wifi {
            self.routing.bind_to_wifi_network();
        }
        self.discovery.handle_network_changed().await
    }

    pub fn devices(&self) -> watch::Receiver<Vec<DiscoveredDevice>> {
        self.discovery.observe_discovered_devices()
    }

    pub fn discovery(&self) -> &DiscoveryService {
        &self.discovery
    }

    fn rollback(&self, wifi_bound: bool) {
        if wifi_bound {
            self.routing.reset_network_binding();
        }
    }
}
