use std::time::Duration;

use ir_core::discovery::{SERVICE_NAME_PREFIX, SERVICE_TYPE};
use ir_core::SyncConfig;

/// Runtime parameters of the discovery service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub service_type: String,
    pub instance_prefix: String,
    pub probe_timeout: Duration,
    pub restart_delay: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            service_type: SERVICE_TYPE.to_string(),
            instance_prefix: SERVICE_NAME_PREFIX.to_string(),
            probe_timeout: Duration::from_millis(SyncConfig::DEFAULT_PROBE_TIMEOUT_MS),
            restart_delay: Duration::from_millis(SyncConfig::DEFAULT_RESTART_DELAY_MS),
        }
    }
}

impl DiscoverySettings {
    /// Expects a config already passed through [`SyncConfig::resolve`].
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            service_type: config.service_type.clone(),
            instance_prefix: config.instance_prefix.clone(),
            probe_timeout: config.probe_timeout(),
            restart_delay: config.restart_delay(),
        }
    }
}
