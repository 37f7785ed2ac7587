use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DeviceInfo;
use crate::ids::DeviceId;

/// A peer found on the LAN and fully resolved.
///
/// `is_reachable` is set on resolution and only re-checked when the caller
/// explicitly probes the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub device_info: DeviceInfo,
    pub is_reachable: bool,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveredDevice {
    pub fn resolved(device_info: DeviceInfo, discovered_at: DateTime<Utc>) -> Self {
        Self {
            device_info,
            is_reachable: true,
            discovered_at,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_info.device_id
    }
}
