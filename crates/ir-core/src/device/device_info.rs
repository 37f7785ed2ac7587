use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::DeviceType;
use crate::ids::DeviceId;

/// Identity and endpoint of a device taking part in LAN sync.
///
/// Created when the local device starts broadcasting, or when a peer
/// advertisement is resolved. Treated as an immutable value: re-discovery
/// produces a new instance that replaces the stale one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: DeviceId,
    pub device_name: String,
    pub device_type: DeviceType,
    pub app_version: String,
    pub ip_address: IpAddr,
    pub port: u16,
    pub last_seen: DateTime<Utc>,
}

impl DeviceInfo {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip_address, self.port)
    }
}
