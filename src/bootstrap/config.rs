//! # Configuration Loader / 配置加载器
//!
//! Reads a TOML file into the [`SyncConfig`] DTO. Pure data loading: no
//! validation and no defaults here, those belong to `SyncConfig::resolve`.
//!
//! 仅负责加载数据，不做校验，也不填默认值。

use anyhow::Context;
use std::path::{Path, PathBuf};

use ir_core::SyncConfig;

pub const CONFIG_FILE_NAME: &str = "lansync.toml";
const APP_DIR_NAME: &str = "ireader";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// **NO validation is performed**: empty strings, zero timeouts and
/// out-of-range ports are accepted as facts.
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<SyncConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    SyncConfig::from_toml(&toml_value)
}

/// Load `path` if it exists, otherwise use production defaults.
pub fn load_config_or_default(path: &Path) -> anyhow::Result<SyncConfig> {
    if path.exists() {
        load_config(path.to_path_buf())
    } else {
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        Ok(SyncConfig::with_defaults())
    }
}

/// `<config dir>/ireader/lansync.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("Failed to locate the user config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// `<data dir>/ireader`: certificates, pins and the device id live here.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir().context("Failed to locate the user data directory")?;
    Ok(base.join(APP_DIR_NAME))
}
