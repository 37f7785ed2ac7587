use std::path::PathBuf;
use std::time::Duration;

use crate::discovery::{SERVICE_NAME_PREFIX, SERVICE_TYPE};

/// LAN sync configuration DTO
/// 局域网同步配置 DTO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// DNS-SD service type, without the `.local.` domain
    pub service_type: String,

    /// Instance name prefix, joined to the device name with `-`
    pub instance_prefix: String,

    /// Reachability probe timeout in milliseconds
    pub probe_timeout_ms: u64,

    /// Delay between stop and restart when refreshing discovery
    pub restart_delay_ms: u64,

    /// Advertised device name (may be empty)
    /// 广播的设备名称（可能为空）
    pub device_name: String,

    /// Port of the local sync server
    pub port: u16,

    /// Bind sockets to the WiFi interface before broadcasting.
    /// `None` when the file does not say; [`SyncConfig::resolve`] turns it on.
    pub bind_to_wifi: Option<bool>,

    /// Directory for rolling log files; empty disables file logging
    pub log_dir: PathBuf,
}

impl SyncConfig {
    pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_RESTART_DELAY_MS: u64 = 1_500;

    /// Create SyncConfig from TOML value
    /// 从 TOML 值创建 SyncConfig
    ///
    /// No validation and no defaults: absent keys map to empty values and
    /// out-of-range ports are truncated, exactly as read.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let str_at = |section: &str, key: &str| -> String {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let int_at = |section: &str, key: &str| -> i64 {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
        };

        Ok(Self {
            service_type: str_at("discovery", "service_type"),
            instance_prefix: str_at("discovery", "instance_prefix"),
            probe_timeout_ms: int_at("discovery", "probe_timeout_ms").max(0) as u64,
            restart_delay_ms: int_at("discovery", "restart_delay_ms").max(0) as u64,
            device_name: str_at("device", "device_name"),
            port: int_at("device", "port") as u16,
            bind_to_wifi: toml_value
                .get("network")
                .and_then(|n| n.get("bind_to_wifi"))
                .and_then(|v| v.as_bool()),
            log_dir: PathBuf::from(str_at("logging", "log_dir")),
        })
    }

    /// All-empty configuration
    /// 全部为空值的配置
    pub fn empty() -> Self {
        Self {
            service_type: String::new(),
            instance_prefix: String::new(),
            probe_timeout_ms: 0,
            restart_delay_ms: 0,
            device_name: String::new(),
            port: 0,
            bind_to_wifi: None,
            log_dir: PathBuf::new(),
        }
    }

    /// Production values. `device_name` and `port` stay empty: they belong
    /// to the host application.
    pub fn with_defaults() -> Self {
        Self {
            service_type: SERVICE_TYPE.to_string(),
            instance_prefix: SERVICE_NAME_PREFIX.to_string(),
            probe_timeout_ms: Self::DEFAULT_PROBE_TIMEOUT_MS,
            restart_delay_ms: Self::DEFAULT_RESTART_DELAY_MS,
            device_name: String::new(),
            port: 0,
            bind_to_wifi: Some(true),
            log_dir: PathBuf::new(),
        }
    }

    /// Fill empty/zero fields from [`SyncConfig::with_defaults`].
    ///
    /// An explicit `bind_to_wifi = false` is kept; only an absent value is
    /// defaulted.
    pub fn resolve(self) -> Self {
        let defaults = Self::with_defaults();
        Self {
            bind_to_wifi: self.bind_to_wifi.or(defaults.bind_to_wifi),
            service_type: non_empty_or(self.service_type, defaults.service_type),
            instance_prefix: non_empty_or(self.instance_prefix, defaults.instance_prefix),
            probe_timeout_ms: non_zero_or(self.probe_timeout_ms, defaults.probe_timeout_ms),
            restart_delay_ms: non_zero_or(self.restart_delay_ms, defaults.restart_delay_ms),
            ..self
        }
    }

    /// Whether LAN sync pins sockets to WiFi. Absent means yes.
    pub fn binds_to_wifi(&self) -> bool {
        self.bind_to_wifi.unwrap_or(true)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

fn non_empty_or(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn non_zero_or(value: u64, fallback: u64) -> u64 {
    if value == 0 {
        fallback
    } else {
        value
    }
}
