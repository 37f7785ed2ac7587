use std::sync::Arc;
use tracing::debug;

use ir_core::ports::{NetworkBindingError, NetworkBindingPort};
use ir_core::NetworkCandidate;

use super::connector::BoundSocketConnector;
use super::interfaces::list_networks;

type NetworkSource =
    Arc<dyn Fn() -> Result<Vec<NetworkCandidate>, NetworkBindingError> + Send + Sync>;

/// Desktop [`NetworkBindingPort`]: interfaces from the OS, binding applied
/// to every socket created through the shared [`BoundSocketConnector`].
pub struct SocketBindingNetworkAdapter {
    connector: Arc<BoundSocketConnector>,
    source: NetworkSource,
}

impl SocketBindingNetworkAdapter {
    pub fn new(connector: Arc<BoundSocketConnector>) -> Self {
        Self::with_source(connector, list_networks)
    }

    /// Use a custom enumeration instead of the OS interface list.
    pub fn with_source(
        connector: Arc<BoundSocketConnector>,
        source: impl Fn() -> Result<Vec<NetworkCandidate>, NetworkBindingError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            connector,
            source: Arc::new(source),
        }
    }

    pub fn connector(&self) -> &Arc<BoundSocketConnector> {
        &self.connector
    }
}

impl NetworkBindingPort for SocketBindingNetworkAdapter {
    fn active_networks(&self) -> Result<Vec<NetworkCandidate>, NetworkBindingError> {
        let networks = (self.source)()?;
        debug!(count = networks.len(), "Enumerated networks");
        Ok(networks)
    }

    fn bind_process_to_network(&self, network: &NetworkCandidate) -> Result<(), NetworkBindingError> {
        let still_present = self
            .active_networks()?
            .iter()
            .any(|n| n.name == network.name);
        if !still_present {
            return Err(NetworkBindingError::BindRejected {
                network: network.name.clone(),
                reason: "interface went away".to_string(),
            });
        }
        self.connector.bind_to(network).map(|_| ())
    }

    fn clear_process_binding(&self) -> Result<(), NetworkBindingError> {
        self.connector.clear();
        Ok(())
    }
}
