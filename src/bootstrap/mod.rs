pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use config::{default_config_path, default_data_dir, load_config, load_config_or_default};
pub use run::run_lansync;
pub use wiring::{wire_runtime, LanSyncRuntime, WiringError};
