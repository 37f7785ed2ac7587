use anyhow::Context;
use std::path::PathBuf;

use ireader_lansync::bootstrap::{
    default_config_path, default_data_dir, load_config_or_default, run_lansync,
    tracing::init_tracing_subscriber,
};

/// Usage: `ireader-lansync [config.toml] [data-dir]`
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args_os().skip(1);
    let config_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => default_config_path()?,
    };
    let data_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => default_data_dir()?,
    };

    let config = load_config_or_default(&config_path)?.resolve();
    init_tracing_subscriber(&config.log_dir).context("Failed to initialize tracing")?;
    tracing::info!(config = %config_path.display(), data_dir = %data_dir.display(), "Starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(run_lansync(config, &data_dir))
}
