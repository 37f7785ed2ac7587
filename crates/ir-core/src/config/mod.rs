//! # Configuration DTO / 配置数据
//!
//! Plain data mapped from TOML. Missing keys are carried as empty values
//! (empty string, `0`, `false`); they are facts, not errors. Production
//! values come from [`SyncConfig::with_defaults`] and are merged in with
//! [`SyncConfig::resolve`].

pub mod sync_config;

pub use sync_config::SyncConfig;
