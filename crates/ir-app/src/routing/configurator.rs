//! Keeps LAN sync traffic on the WiFi network when a VPN is up.
//!
//! ```text
//! Unbound ──bind_to_wifi_network()──▶ Bound(network)
//!    ▲                                     │
//!    └──── reset_network_binding() ────────┘
//!          (or a failed bind attempt)
//! ```

use std::sync::{Arc, Mutex};
use tracing::{debug, info, info_span, warn};

use ir_core::network::select_wifi_candidate;
use ir_core::ports::NetworkBindingPort;
use ir_core::NetworkCandidate;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BindingState {
    #[default]
    Unbound,
    Bound(NetworkCandidate),
}

pub struct NetworkRoutingConfigurator {
    port: Arc<dyn NetworkBindingPort>,
    state: Mutex<BindingState>,
}

impl NetworkRoutingConfigurator {
    pub fn new(port: Arc<dyn NetworkBindingPort>) -> Self {
        Self {
            port,
            state: Mutex::new(BindingState::Unbound),
        }
    }

    /// Bind the process to a WiFi network, preferring one without a VPN.
    ///
    /// Candidates are re-enumerated on every call. Returns `false` without
    /// touching routing when no WiFi network exists. A rejected bind falls
    /// back to default routing and also returns `false`.
    pub fn bind_to_wifi_network(&self) -> bool {
        let _span = info_span!("routing.bind_to_wifi_network").entered();

        let networks = match self.port.active_networks() {
            Ok(networks) => networks,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate networks");
                return false;
            }
        };

        let Some(target) = select_wifi_candidate(&networks) else {
            info!(candidates = networks.len(), "No WiFi network available");
            return false;
        };

        match self.port.bind_process_to_network(target) {
            Ok(()) => {
                info!(network = %target, vpn = target.is_vpn(), "Bound process to WiFi network");
                *self.lock_state() = BindingState::Bound(target.clone());
                true
            }
            Err(e) => {
                warn!(network = %target, error = %e, "Failed to bind to WiFi network, restoring default routing");
                self.restore_default_routing();
                false
            }
        }
    }

    /// Restore default routing. Never fails.
    pub fn reset_network_binding(&self) {
        let _span = info_span!("routing.reset_network_binding").entered();
        self.restore_default_routing();
        info!("Network binding reset");
    }

    pub fn is_wifi_available(&self) -> bool {
        match self.port.active_networks() {
            Ok(networks) => networks.iter().any(NetworkCandidate::is_wifi),
            Err(e) => {
                debug!(error = %e, "Network enumeration failed");
                false
            }
        }
    }

    pub fn current_binding(&self) -> Option<NetworkCandidate> {
        match &*self.lock_state() {
            BindingState::Bound(network) => Some(network.clone()),
            BindingState::Unbound => None,
        }
    }

    pub fn state(&self) -> BindingState {
        self.lock_state().clone()
    }

    fn restore_default_routing(&self) {
        if let Err(e) = self.port.clear_process_binding() {
            warn!(error = %e, "Failed to restore default routing");
        }
        *self.lock_state() = BindingState::Unbound;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BindingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_core::ports::NetworkBindingError;
    use ir_core::Transport;
    use mockall::{mock, Sequence};
    use std::net::{IpAddr, Ipv4Addr};

    mock! {
        pub Binding {}

        impl NetworkBindingPort for Binding {
            fn active_networks(&self) -> Result<Vec<NetworkCandidate>, NetworkBindingError>;
            fn bind_process_to_network(&self, network: &NetworkCandidate)
                -> Result<(), NetworkBindingError>;
            fn clear_process_binding(&self) -> Result<(), NetworkBindingError>;
        }
    }

    fn wifi(name: &str, vpn: bool) -> NetworkCandidate {
        let candidate = NetworkCandidate::new(name, vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7))])
            .with_transport(Transport::Wifi);
        if vpn {
            candidate.with_transport(Transport::Vpn)
        } else {
            candidate
        }
    }

    fn ethernet() -> NetworkCandidate {
        NetworkCandidate::new("eth0", vec![]).with_transport(Transport::Ethernet)
    }

    fn bound_to(name: &'static str) -> impl Fn(&NetworkCandidate) -> bool {
        move |n| n.name == name
    }

    #[test]
    fn test_binds_to_wifi_without_vpn_first() {
        let mut port = MockBinding::new();
        port.expect_active_networks()
            .returning(|| Ok(vec![wifi("wlan1", true), ethernet(), wifi("wlan0", false)]));
        port.expect_bind_process_to_network()
            .withf(bound_to("wlan0"))
            .times(1)
            .returning(|_| Ok(()));

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));

        assert!(configurator.bind_to_wifi_network());
        assert_eq!(configurator.current_binding().unwrap().name, "wlan0");
    }

    #[test]
    fn test_falls_back_to_wifi_with_vpn() {
        let mut port = MockBinding::new();
        port.expect_active_networks()
            .returning(|| Ok(vec![ethernet(), wifi("wlan1", true)]));
        port.expect_bind_process_to_network()
            .withf(bound_to("wlan1"))
            .times(1)
            .returning(|_| Ok(()));

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));

        assert!(configurator.bind_to_wifi_network());
        assert!(configurator.current_binding().unwrap().is_vpn());
    }

    #[test]
    fn test_no_wifi_leaves_routing_untouched() {
        let mut port = MockBinding::new();
        port.expect_active_networks().returning(|| Ok(vec![ethernet()]));
        port.expect_bind_process_to_network().never();
        port.expect_clear_process_binding().never();

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));

        assert!(!configurator.bind_to_wifi_network());
        assert!(!configurator.is_wifi_available());
        assert_eq!(configurator.state(), BindingState::Unbound);
    }

    #[test]
    fn test_rejected_bind_resets_to_default_routing() {
        let mut seq = Sequence::new();
        let mut port = MockBinding::new();
        port.expect_active_networks()
            .returning(|| Ok(vec![wifi("wlan0", false)]));
        port.expect_bind_process_to_network()
            .withf(bound_to("wlan0"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(NetworkBindingError::BindRejected {
                    network: "wlan0".to_string(),
                    reason: "permission denied".to_string(),
                })
            });
        port.expect_clear_process_binding()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));

        assert!(!configurator.bind_to_wifi_network());
        assert_eq!(configurator.current_binding(), None);
    }

    #[test]
    fn test_enumeration_failure_is_not_fatal() {
        let mut port = MockBinding::new();
        port.expect_active_networks()
            .returning(|| Err(NetworkBindingError::Enumeration("netlink closed".to_string())));
        port.expect_bind_process_to_network().never();
        port.expect_clear_process_binding().never();

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));

        assert!(!configurator.bind_to_wifi_network());
        assert!(!configurator.is_wifi_available());
    }

    #[test]
    fn test_reset_clears_binding_even_when_platform_fails() {
        let mut port = MockBinding::new();
        port.expect_active_networks()
            .returning(|| Ok(vec![wifi("wlan0", false)]));
        port.expect_bind_process_to_network()
            .withf(bound_to("wlan0"))
            .returning(|_| Ok(()));
        port.expect_clear_process_binding()
            .times(1)
            .returning(|| Err(NetworkBindingError::Platform("gone".to_string())));

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));
        assert!(configurator.bind_to_wifi_network());

        configurator.reset_network_binding();

        assert_eq!(configurator.state(), BindingState::Unbound);
    }

    #[test]
    fn test_rebinding_re_evaluates_candidates() {
        let mut seq = Sequence::new();
        let mut port = MockBinding::new();
        port.expect_active_networks()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![wifi("wlan0", false)]));
        port.expect_bind_process_to_network()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        port.expect_active_networks()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![wifi("wlan9", true)]));
        port.expect_bind_process_to_network()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let configurator = NetworkRoutingConfigurator::new(Arc::new(port));

        assert!(configurator.bind_to_wifi_network());
        assert!(configurator.bind_to_wifi_network());
        assert_eq!(configurator.current_binding().unwrap().name, "wlan9");
    }
}
