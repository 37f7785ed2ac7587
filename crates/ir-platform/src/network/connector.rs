use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::RwLock;
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};
use tracing::{debug, info};

use ir_core::ports::{NetworkBindingError, ReachabilityPort};
use ir_core::NetworkCandidate;

/// Interface every new socket is pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInterface {
    pub name: String,
    pub addresses: Vec<IpAddr>,
}

impl BoundInterface {
    /// Local address of the same family as `target`.
    pub fn source_address_for(&self, target: &SocketAddr) -> Option<IpAddr> {
        self.addresses
            .iter()
            .copied()
            .find(|a| a.is_ipv4() == target.is_ipv4())
    }
}

/// Creates TCP sockets on the currently bound interface, or on default
/// routing when nothing is bound.
///
/// Linux and Android use `SO_BINDTODEVICE`; where that is unavailable (or
/// not permitted) the socket is bound to the interface's source address.
#[derive(Debug, Default)]
pub struct BoundSocketConnector {
    bound: RwLock<Option<BoundInterface>>,
}

impl BoundSocketConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_to(&self, network: &NetworkCandidate) -> Result<BoundInterface, NetworkBindingError> {
        if network.addresses.is_empty() {
            return Err(NetworkBindingError::BindRejected {
                network: network.name.clone(),
                reason: "interface has no usable address".to_string(),
            });
        }

        let interface = BoundInterface {
            name: network.name.clone(),
            addresses: network.addresses.clone(),
        };
        *self.bound.write().unwrap_or_else(|e| e.into_inner()) = Some(interface.clone());
        info!(interface = %interface.name, "Sockets now bound to interface");
        Ok(interface)
    }

    pub fn clear(&self) {
        let previous = self.bound.write().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(previous) = previous {
            info!(interface = %previous.name, "Socket binding cleared");
        }
    }

    pub fn bound_interface(&self) -> Option<BoundInterface> {
        self.bound.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Unconnected socket for `target`, pinned to the bound interface.
    pub fn socket_for(&self, target: &SocketAddr) -> io::Result<TcpSocket> {
        let socket = if target.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        let Some(interface) = self.bound_interface() else {
            return Ok(socket);
        };

        #[cfg(any(target_os = "linux", target_os = "android"))]
        match socket.bind_device(Some(interface.name.as_bytes())) {
            Ok(()) => return Ok(socket),
            Err(e) => debug!(
                interface = %interface.name,
                error = %e,
                "SO_BINDTODEVICE unavailable, binding source address instead"
            ),
        }

        if let Some(source) = interface.source_address_for(target) {
            socket.bind(SocketAddr::new(source, 0))?;
        } else {
            debug!(interface = %interface.name, %target, "No source address of matching family");
        }
        Ok(socket)
    }

    pub async fn connect(&self, target: SocketAddr) -> io::Result<TcpStream> {
        self.socket_for(&target)?.connect(target).await
    }
}

#[async_trait]
impl ReachabilityPort for BoundSocketConnector {
    async fn probe(&self, addr: SocketAddr, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.connect(addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "Reachability probe failed");
                false
            }
            Err(_) => {
                debug!(%addr, ?timeout, "Reachability probe timed out");
                false
            }
        }
    }
}
