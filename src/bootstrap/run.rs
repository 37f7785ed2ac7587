use anyhow::Context;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use ir_core::{DiscoveredDevice, SyncConfig};

use super::wiring::{wire_runtime, LanSyncRuntime};

/// Bind the sync port, bring LAN sync up and run until Ctrl-C.
///
/// 绑定同步端口，启动局域网同步，直到收到 Ctrl-C。
pub async fn run_lansync(config: SyncConfig, data_dir: &Path) -> anyhow::Result<()> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port)))
        .await
        .with_context(|| format!("Failed to bind sync port {}", config.port))?;
    let port = listener.local_addr()?.port();

    let runtime = wire_runtime(config, data_dir, port).context("Failed to wire LAN sync")?;
    let fingerprint = runtime.local_fingerprint().await?;
    // Surfaces certificate problems before anything is advertised.
    runtime
        .secure_channels
        .server_context()
        .await
        .context("Failed to build TLS server context")?;
    info!(
        device_id = %runtime.local.device_id,
        port,
        fingerprint = %fingerprint,
        "Local sync endpoint ready"
    );

    let accept_task = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                // The payload protocol runs on top of this port elsewhere.
                Ok((_stream, peer)) => debug!(%peer, "Accepted sync connection"),
                Err(e) => warn!(error = %e, "Accept failed"),
            }
        }
    });

    let status = runtime
        .session
        .enable(runtime.local.clone())
        .await
        .context("Failed to enable LAN sync")?;
    info!(wifi_bound = status.wifi_bound, "Broadcasting and discovering");

    watch_devices(&runtime).await;

    runtime.session.disable();
    accept_task.abort();
    Ok(())
}

async fn watch_devices(runtime: &LanSyncRuntime) {
    let mut devices = runtime.session.devices();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = devices.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = devices.borrow_and_update().clone();
                log_devices(runtime, &snapshot).await;
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }
}

async fn log_devices(runtime: &LanSyncRuntime, devices: &[DiscoveredDevice]) {
    info!(count = devices.len(), "Discovered devices changed");
    for device in devices {
        let reachable = runtime.discovery.verify_device(&device.device_info).await;
        let pinned = runtime
            .pinning
            .get_pinned_fingerprint(&device.device_info.device_id)
            .await
            .ok()
            .flatten()
            .is_some();
        info!(
            name = %device.device_info.device_name,
            addr = %device.device_info.socket_addr(),
            reachable,
            pinned,
            "Peer"
        );
    }
}
