//! # Dependency Injection / 依赖注入模块
//!
//! Creates the platform adapters and hands them to the `ir-app` services
//! through their ports. Assembly only: no decisions about what to do when
//! something is missing.
//!
//! > **This is the only place allowed to depend on ir-platform + ir-app simultaneously.**
//! > **这是唯一允许同时依赖 ir-platform 和 ir-app 的地方。**

use chrono::Utc;
use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use ir_app::{
    CertificatePinningManager, DiscoveryService, DiscoverySettings, LanSyncSession,
    NetworkRoutingConfigurator, SecureChannelFactory,
};
use ir_core::ports::{CertificateServicePort, PinnedFingerprintStorePort, ServiceDiscoveryPort};
use ir_core::security::CREDENTIAL_ALIAS;
use ir_core::{CertificateFingerprint, DeviceId, DeviceInfo, DeviceType, SyncConfig};
use ir_platform::tls::create_credential;
use ir_platform::{
    BoundSocketConnector, FilePinnedFingerprintStore, MdnsServiceDiscovery, RustlsContextFactory,
    SelfSignedCertificateService, SocketBindingNetworkAdapter, TransportTlsBinding,
};

const DEVICE_ID_FILE: &str = "device_id";

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
/// 依赖注入错误（基础设施初始化失败）
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Device identity initialization failed: {0}")]
    DeviceIdentity(String),

    #[error("Service discovery initialization failed: {0}")]
    DiscoveryInit(String),

    #[error("Network initialization failed: {0}")]
    NetworkInit(String),

    #[error("Certificate initialization failed: {0}")]
    CertificateInit(String),
}

/// Every service of a running LAN sync node.
pub struct LanSyncRuntime {
    pub config: SyncConfig,
    pub local: DeviceInfo,
    pub discovery: Arc<DiscoveryService>,
    pub routing: Arc<NetworkRoutingConfigurator>,
    pub session: LanSyncSession,
    pub pinning: Arc<CertificatePinningManager>,
    pub secure_channels: SecureChannelFactory<RustlsContextFactory>,
    pub transport: TransportTlsBinding,
    pub connector: Arc<BoundSocketConnector>,
    certificates: Arc<dyn CertificateServicePort>,
}

impl LanSyncRuntime {
    /// Fingerprint peers must pin for this device.
    pub async fn local_fingerprint(&self) -> anyhow::Result<CertificateFingerprint> {
        let data = self.certificates.certificate(CREDENTIAL_ALIAS).await?;
        Ok(*create_credential(&data)?.fingerprint())
    }
}

/// Read the installation's device id, creating it on first run.
pub fn load_or_create_device_id(data_dir: &Path) -> WiringResult<DeviceId> {
    let path = data_dir.join(DEVICE_ID_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => {
            return Ok(DeviceId::new(content.trim().to_string()))
        }
        Ok(_) => warn!(path = %path.display(), "Device id file is empty, regenerating"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(WiringError::DeviceIdentity(format!(
                "failed to read device id: {err}"
            )))
        }
    }

    std::fs::create_dir_all(data_dir).map_err(|err| {
        WiringError::DeviceIdentity(format!("failed to create data dir: {err}"))
    })?;
    let device_id = DeviceId::generate();
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, device_id.as_str()).map_err(|err| {
        WiringError::DeviceIdentity(format!("failed to write device id temp file: {err}"))
    })?;
    std::fs::rename(&tmp_path, &path).map_err(|err| {
        WiringError::DeviceIdentity(format!("failed to commit device id file: {err}"))
    })?;

    info!(device_id = %device_id, "Generated new device id");
    Ok(device_id)
}

/// Configured name, or the host name when the config leaves it blank.
pub fn resolve_device_name(config: &SyncConfig) -> String {
    if !config.device_name.trim().is_empty() {
        return config.device_name.clone();
    }
    gethostname::gethostname()
        .to_str()
        .unwrap_or("Unknown Device")
        .to_string()
}

fn local_ip() -> WiringResult<IpAddr> {
    local_ip_address::local_ip()
        .map_err(|e| WiringError::NetworkInit(format!("failed to determine local IP: {e}")))
}

/// Assemble the runtime. `config` should already be resolved; `port` is the
/// port the sync server actually listens on.
pub fn wire_runtime(config: SyncConfig, data_dir: &Path, port: u16) -> WiringResult<LanSyncRuntime> {
    let device_id = load_or_create_device_id(data_dir)?;
    let local = DeviceInfo {
        device_id: device_id.clone(),
        device_name: resolve_device_name(&config),
        device_type: DeviceType::Desktop,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        ip_address: local_ip()?,
        port,
        last_seen: Utc::now(),
    };

    let mdns: Arc<dyn ServiceDiscoveryPort> = Arc::new(
        MdnsServiceDiscovery::new().map_err(|e| WiringError::DiscoveryInit(e.to_string()))?,
    );
    let connector = Arc::new(BoundSocketConnector::new());
    let discovery = Arc::new(
        DiscoveryService::new(
            mdns,
            connector.clone(),
            DiscoverySettings::from_config(&config),
        )
        .with_local_device_id(device_id),
    );
    let routing = Arc::new(NetworkRoutingConfigurator::new(Arc::new(
        SocketBindingNetworkAdapter::new(connector.clone()),
    )));
    let session = LanSyncSession::new(
        discovery.clone(),
        routing.clone(),
        config.binds_to_wifi(),
    );

    let certificates: Arc<dyn CertificateServicePort> = Arc::new(
        SelfSignedCertificateService::persistent(data_dir, vec![local.device_name.clone()]),
    );
    let pin_store: Arc<dyn PinnedFingerprintStorePort> =
        Arc::new(FilePinnedFingerprintStore::new(data_dir));
    let pinning = Arc::new(CertificatePinningManager::new(pin_store));
    let tls = RustlsContextFactory::default();
    let secure_channels =
        SecureChannelFactory::new(Arc::new(tls.clone()), certificates.clone(), pinning.clone());

    Ok(LanSyncRuntime {
        config,
        local,
        discovery,
        routing,
        session,
        pinning,
        secure_channels,
        transport: TransportTlsBinding::new(tls),
        connector,
        certificates,
    })
}
