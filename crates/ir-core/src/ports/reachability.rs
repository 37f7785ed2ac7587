use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;

/// Raw reachability check against a peer endpoint.
#[async_trait]
pub trait ReachabilityPort: Send + Sync {
    /// `true` if a TCP connection to `addr` completes within `timeout`.
    /// Every failure, timeout included, is `false`.
    async fn probe(&self, addr: SocketAddr, timeout: Duration) -> bool;
}
