//! Bridges from platform discovery callbacks to futures and the registry.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use ir_core::discovery::{device_id_from_attributes, parse_resolved, DiscoveryRegistry};
use ir_core::ports::{
    DiscoveryListener, RegistrationListener, ResolveListener, ResolvedService,
    ServiceAdvertisement, ServiceDiscoveryError, ServiceDiscoveryPort,
};
use ir_core::DeviceId;

type Completion = oneshot::Sender<Result<(), ServiceDiscoveryError>>;

/// Resolves a pending start call exactly once; later callbacks are ignored.
struct OnceCompletion(Mutex<Option<Completion>>);

impl OnceCompletion {
    fn new(tx: Completion) -> Self {
        Self(Mutex::new(Some(tx)))
    }

    fn complete(&self, outcome: Result<(), ServiceDiscoveryError>) {
        let tx = self.0.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(tx) = tx {
            // Receiver gone means the caller was cancelled; the guard cleans up.
            let _ = tx.send(outcome);
        }
    }
}

pub(crate) struct RegistrationCompletion {
    completion: OnceCompletion,
}

impl RegistrationCompletion {
    pub(crate) fn new(tx: Completion) -> Self {
        Self {
            completion: OnceCompletion::new(tx),
        }
    }
}

impl RegistrationListener for RegistrationCompletion {
    fn on_registered(&self, instance_name: &str) {
        info!(instance = instance_name, "Service registered");
        self.completion.complete(Ok(()));
    }

    fn on_registration_failed(&self, error: ServiceDiscoveryError) {
        warn!(error = %error, "Service registration failed");
        self.completion.complete(Err(error));
    }
}

/// State shared by every callback of one discovery session.
pub(crate) struct SessionSink {
    pub(crate) session: u64,
    pub(crate) current_session: Arc<AtomicU64>,
    pub(crate) registry: Arc<DiscoveryRegistry>,
    pub(crate) local_device_id: Arc<RwLock<Option<DeviceId>>>,
}

impl SessionSink {
    fn is_current(&self) -> bool {
        self.current_session.load(Ordering::SeqCst) == self.session
    }

    fn is_local(&self, device_id: &DeviceId) -> bool {
        self.local_device_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            == Some(device_id)
    }

    fn handle_lost(&self, service: ServiceAdvertisement) {
        if !self.is_current() {
            return;
        }
        match device_id_from_attributes(&service.attributes) {
            Some(device_id) => {
                if self.registry.remove(&device_id) {
                    info!(device_id = %device_id, instance = %service.instance_name, "Device lost");
                }
            }
            None => debug!(
                instance = %service.instance_name,
                "Lost advertisement carries no deviceId, ignoring"
            ),
        }
    }
}

impl ResolveListener for SessionSink {
    fn on_resolved(&self, service: ResolvedService) {
        if !self.is_current() {
            debug!(instance = %service.instance_name, "Resolution from stale session dropped");
            return;
        }

        let Some(device) =
            parse_resolved(&service.attributes, service.host, service.port, Utc::now())
        else {
            return;
        };

        if self.is_local(device.device_id()) {
            debug!(instance = %service.instance_name, "Skipping own advertisement");
            return;
        }

        info!(
            device_id = %device.device_id(),
            device_name = %device.device_info.device_name,
            addr = %device.device_info.socket_addr(),
            "Device discovered"
        );
        self.registry.upsert(device);
    }

    fn on_resolve_failed(&self, service: ServiceAdvertisement, error: ServiceDiscoveryError) {
        warn!(instance = %service.instance_name, error = %error, "Failed to resolve service");
    }
}

pub(crate) struct DiscoverySessionListener {
    started: OnceCompletion,
    sink: Arc<SessionSink>,
    port: Weak<dyn ServiceDiscoveryPort>,
    service_type: String,
}

impl DiscoverySessionListener {
    pub(crate) fn new(
        tx: Completion,
        sink: SessionSink,
        port: Weak<dyn ServiceDiscoveryPort>,
        service_type: String,
    ) -> Self {
        Self {
            started: OnceCompletion::new(tx),
            sink: Arc::new(sink),
            port,
            service_type,
        }
    }
}

impl DiscoveryListener for DiscoverySessionListener {
    fn on_discovery_started(&self, service_type: &str) {
        info!(service_type, "Service discovery started");
        self.started.complete(Ok(()));
    }

    fn on_start_discovery_failed(&self, error: ServiceDiscoveryError) {
        warn!(error = %error, "Service discovery failed to start");
        self.started.complete(Err(error));
    }

    fn on_service_found(&self, service: ServiceAdvertisement) {
        if !self.sink.is_current() {
            return;
        }
        if !same_service_type(&service.service_type, &self.service_type) {
            debug!(
                found = %service.service_type,
                expected = %self.service_type,
                "Ignoring service of another type"
            );
            return;
        }
        let Some(port) = self.port.upgrade() else {
            return;
        };

        debug!(instance = %service.instance_name, "Service found, resolving");
        let listener: Arc<dyn ResolveListener> = self.sink.clone();
        port.resolve_service(service, listener);
    }

    fn on_service_lost(&self, service: ServiceAdvertisement) {
        self.sink.handle_lost(service);
    }
}

/// Compares service types ignoring a trailing `.local.` domain and dots.
fn same_service_type(found: &str, expected: &str) -> bool {
    fn normalize(s: &str) -> &str {
        let s = s.trim_end_matches('.');
        s.strip_suffix(".local").unwrap_or(s)
    }
    normalize(found).eq_ignore_ascii_case(normalize(expected))
}
