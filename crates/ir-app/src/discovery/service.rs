//! LAN discovery service: advertise the local device, track peers, probe them.
//!
//! 局域网发现服务：广播本机、跟踪对端设备、探测可达性。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, info_span, warn, Instrument};

use ir_core::discovery::{attributes_for, instance_name, DiscoveryRegistry};
use ir_core::ports::{
    DiscoveryHandle, RegistrationHandle, ReachabilityPort, ServiceDiscoveryError,
    ServiceDiscoveryPort, ServiceRegistration,
};
use ir_core::{DeviceId, DeviceInfo, DiscoveredDevice};

use super::listeners::{DiscoverySessionListener, RegistrationCompletion, SessionSink};
use super::{DiscoveryError, DiscoverySettings};

#[derive(Default)]
struct SessionState {
    registration: Option<(RegistrationHandle, DeviceInfo)>,
    discovery: Option<DiscoveryHandle>,
}

pub struct DiscoveryService {
    port: Arc<dyn ServiceDiscoveryPort>,
    reachability: Arc<dyn ReachabilityPort>,
    settings: DiscoverySettings,
    registry: Arc<DiscoveryRegistry>,
    /// Set by the first broadcast and kept afterwards so self-filtering never
    /// races a stop/start of broadcasting.
    local_device_id: Arc<RwLock<Option<DeviceId>>>,
    current_session: Arc<AtomicU64>,
    state: Mutex<SessionState>,
}

impl DiscoveryService {
    pub fn new(
        port: Arc<dyn ServiceDiscoveryPort>,
        reachability: Arc<dyn ReachabilityPort>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            port,
            reachability,
            settings,
            registry: Arc::new(DiscoveryRegistry::new()),
            local_device_id: Arc::new(RwLock::new(None)),
            current_session: Arc::new(AtomicU64::new(0)),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Filter the local device from discovery results before broadcasting starts.
    pub fn with_local_device_id(self, device_id: DeviceId) -> Self {
        self.set_local_device_id(device_id);
        self
    }

    pub fn local_device_id(&self) -> Option<DeviceId> {
        self.local_device_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    pub fn is_broadcasting(&self) -> bool {
        self.lock_state().registration.is_some()
    }

    pub fn is_discovering(&self) -> bool {
        self.lock_state().discovery.is_some()
    }

    /// Advertise `device_info` on the LAN.
    ///
    /// Completes once the platform confirms the registration. Dropping the
    /// returned future before that withdraws the advertisement.
    pub async fn start_broadcasting(&self, device_info: DeviceInfo) -> Result<(), DiscoveryError> {
        let span = info_span!(
            "discovery.start_broadcasting",
            device_id = %device_info.device_id,
            port = device_info.port
        );

        async {
            self.stop_broadcasting();
            self.set_local_device_id(device_info.device_id.clone());

            let registration = ServiceRegistration {
                service_type: self.settings.service_type.clone(),
                instance_name: instance_name(
                    &self.settings.instance_prefix,
                    &device_info.device_name,
                ),
                port: device_info.port,
                attributes: attributes_for(&device_info),
            };

            let (tx, rx) = oneshot::channel();
            let listener = Arc::new(RegistrationCompletion::new(tx));
            let handle = self
                .port
                .register_service(registration, listener)
                .map_err(|e| DiscoveryError::RegistrationFailed(e.to_string()))?;

            let mut guard = RegistrationGuard::new(self.port.clone(), handle);
            await_completion(rx)
                .await
                .map_err(|e| map_completion_error(e, DiscoveryError::RegistrationFailed))?;
            guard.disarm();

            // A concurrent broadcast may have landed while this one awaited.
            let displaced = self.lock_state().registration.replace((handle, device_info));
            if let Some((previous, _)) = displaced {
                debug!(?previous, "Replacing concurrent registration");
                self.port.unregister_service(previous);
            }
            info!("Broadcasting started");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Withdraw the advertisement, if any. The local device id is kept.
    pub fn stop_broadcasting(&self) {
        let registration = self.lock_state().registration.take();
        if let Some((handle, _)) = registration {
            self.port.unregister_service(handle);
            info!("Broadcasting stopped");
        }
    }

    /// Start a fresh discovery session, replacing any previous one.
    ///
    /// Completes once the platform reports the session started. Dropping the
    /// returned future before that stops the platform session.
    pub async fn start_discovery(&self) -> Result<(), DiscoveryError> {
        let span = info_span!(
            "discovery.start_discovery",
            service_type = %self.settings.service_type
        );

        async {
            self.stop_discovery();

            let session = self.current_session.fetch_add(1, Ordering::SeqCst) + 1;
            let sink = SessionSink {
                session,
                current_session: self.current_session.clone(),
                registry: self.registry.clone(),
                local_device_id: self.local_device_id.clone(),
            };

            let (tx, rx) = oneshot::channel();
            let listener = Arc::new(DiscoverySessionListener::new(
                tx,
                sink,
                Arc::downgrade(&self.port),
                self.settings.service_type.clone(),
            ));
            let handle = self
                .port
                .discover_services(&self.settings.service_type, listener)
                .map_err(|e| DiscoveryError::DiscoveryStartFailed(e.to_string()))?;

            let mut guard = DiscoveryGuard {
                port: self.port.clone(),
                handle: Some(handle),
                current_session: self.current_session.clone(),
                session,
            };
            await_completion(rx)
                .await
                .map_err(|e| map_completion_error(e, DiscoveryError::DiscoveryStartFailed))?;
            guard.disarm();

            let displaced = self.lock_state().discovery.replace(handle);
            if let Some(previous) = displaced {
                debug!(?previous, "Replacing concurrent discovery session");
                self.port.stop_service_discovery(previous);
            }
            debug!(session, "Discovery session active");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Stop listening and clear every discovered device. Idempotent.
    pub fn stop_discovery(&self) {
        // Invalidate callbacks still in flight for the old session.
        self.current_session.fetch_add(1, Ordering::SeqCst);

        let discovery = self.lock_state().discovery.take();
        if let Some(handle) = discovery {
            self.port.stop_service_discovery(handle);
            info!("Discovery stopped");
        }
        self.registry.clear();
    }

    /// Live view of discovered devices. Every call returns an independent receiver.
    pub fn observe_discovered_devices(&self) -> watch::Receiver<Vec<DiscoveredDevice>> {
        self.registry.subscribe()
    }

    pub fn discovered_devices(&self) -> Vec<DiscoveredDevice> {
        self.registry.snapshot()
    }

    /// TCP reachability of the device's endpoint, bounded by the probe timeout.
    pub async fn verify_device(&self, device_info: &DeviceInfo) -> bool {
        let addr = device_info.socket_addr();
        let reachable = self
            .reachability
            .probe(addr, self.settings.probe_timeout)
            .await;
        debug!(device_id = %device_info.device_id, %addr, reachable, "Verified device");
        reachable
    }

    /// Drop every cached peer and restart whatever was running.
    pub async fn force_refresh(&self) -> Result<(), DiscoveryError> {
        let span = info_span!("discovery.force_refresh");

        async {
            let (broadcast_info, was_discovering) = {
                let state = self.lock_state();
                (
                    state.registration.as_ref().map(|(_, info)| info.clone()),
                    state.discovery.is_some(),
                )
            };

            self.registry.clear();
            if was_discovering {
                self.stop_discovery();
            }
            if broadcast_info.is_some() {
                self.stop_broadcasting();
            }

            if broadcast_info.is_none() && !was_discovering {
                debug!("Nothing active, refresh only cleared the cache");
                return Ok(());
            }

            tokio::time::sleep(self.settings.restart_delay).await;

            if let Some(info) = broadcast_info {
                self.start_broadcasting(info).await?;
            }
            if was_discovering {
                self.start_discovery().await?;
            }
            info!("Discovery refreshed");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// React to the active network changing: peers seen on the old network
    /// are dropped at once, then discovery and broadcasting restart.
    pub async fn handle_network_changed(&self) -> Result<(), DiscoveryError> {
        info!("Network changed, clearing discovered devices");
        self.registry.clear();
        self.force_refresh().await
    }

    fn set_local_device_id(&self, device_id: DeviceId) {
        *self
            .local_device_id
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(device_id);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for DiscoveryService {
    fn drop(&mut self) {
        let state = std::mem::take(&mut *self.lock_state());
        if let Some((handle, _)) = state.registration {
            self.port.unregister_service(handle);
        }
        if let Some(handle) = state.discovery {
            self.port.stop_service_discovery(handle);
        }
    }
}

enum CompletionError {
    Rejected(ServiceDiscoveryError),
    Dropped,
}

async fn await_completion(
    rx: oneshot::Receiver<Result<(), ServiceDiscoveryError>>,
) -> Result<(), CompletionError> {
    match rx.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CompletionError::Rejected(e)),
        Err(_) => Err(CompletionError::Dropped),
    }
}

fn map_completion_error(
    error: CompletionError,
    rejected: impl FnOnce(String) -> DiscoveryError,
) -> DiscoveryError {
    match error {
        CompletionError::Rejected(e) => rejected(e.to_string()),
        CompletionError::Dropped => {
            warn!("Platform dropped the listener without answering");
            DiscoveryError::Cancelled
        }
    }
}

/// Unregisters on drop unless disarmed.
struct RegistrationGuard {
    port: Arc<dyn ServiceDiscoveryPort>,
    handle: Option<RegistrationHandle>,
}

impl RegistrationGuard {
    fn new(port: Arc<dyn ServiceDiscoveryPort>, handle: RegistrationHandle) -> Self {
        Self {
            port,
            handle: Some(handle),
        }
    }

    fn disarm(&mut self) {
        self.handle = None;
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(?handle, "Withdrawing unconfirmed registration");
            self.port.unregister_service(handle);
        }
    }
}

/// Stops the discovery session on drop unless disarmed, and retires its
/// session number so late callbacks from the platform are ignored.
struct DiscoveryGuard {
    port: Arc<dyn ServiceDiscoveryPort>,
    handle: Option<DiscoveryHandle>,
    current_session: Arc<AtomicU64>,
    session: u64,
}

impl DiscoveryGuard {
    fn disarm(&mut self) {
        self.handle = None;
    }
}

impl Drop for DiscoveryGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(?handle, "Stopping unconfirmed discovery session");
            // Only retire our own session; a newer one may already be live.
            let _ = self.current_session.compare_exchange(
                self.session,
                self.session + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
            self.port.stop_service_discovery(handle);
        }
    }
}
