use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use ir_core::ports::ReachabilityPort;

/// Plain TCP connect probe on default routing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpReachabilityProbe;

#[async_trait]
impl ReachabilityPort for TcpReachabilityProbe {
    async fn probe(&self, addr: SocketAddr, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
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
