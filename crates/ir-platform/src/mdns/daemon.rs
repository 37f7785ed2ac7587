use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

use ir_core::ports::{
    DiscoveryHandle, DiscoveryListener, RegistrationHandle, RegistrationListener,
    ResolveListener, ResolvedService, ServiceAdvertisement, ServiceDiscoveryError,
    ServiceDiscoveryPort, ServiceRegistration,
};

use super::cache::{instance_from_fullname, ResolvedCache};

const LOCAL_DOMAIN: &str = "local.";

/// [`ServiceDiscoveryPort`] over an `mdns-sd` daemon.
///
/// mdns-sd resolves instances on its own, so `on_service_found` is only
/// emitted once an instance is resolved; `resolve_service` then answers from
/// the cache.
pub struct MdnsServiceDiscovery {
    daemon: ServiceDaemon,
    next_handle: AtomicU64,
    registrations: Mutex<HashMap<RegistrationHandle, String>>,
    browses: Mutex<HashMap<DiscoveryHandle, String>>,
    resolved: Arc<Mutex<ResolvedCache>>,
}

impl MdnsServiceDiscovery {
    pub fn new() -> Result<Self, ServiceDiscoveryError> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| ServiceDiscoveryError::Platform(format!("failed to start mdns daemon: {e}")))?;
        Ok(Self {
            daemon,
            next_handle: AtomicU64::new(1),
            registrations: Mutex::new(HashMap::new()),
            browses: Mutex::new(HashMap::new()),
            resolved: Arc::new(Mutex::new(ResolvedCache::new())),
        })
    }

    fn next_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }
}

impl Drop for MdnsServiceDiscovery {
    fn drop(&mut self) {
        if let Err(e) = self.daemon.shutdown() {
            debug!(error = %e, "mdns daemon shutdown failed");
        }
    }
}

/// `_ireader-sync._tcp` → `_ireader-sync._tcp.local.`
fn ty_domain(service_type: &str) -> String {
    let trimmed = service_type.trim_end_matches('.');
    if trimmed.ends_with(".local") {
        format!("{trimmed}.")
    } else {
        format!("{trimmed}.{LOCAL_DOMAIN}")
    }
}

fn host_name(instance_name: &str) -> String {
    let label: String = instance_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{label}.{LOCAL_DOMAIN}")
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn to_resolved(info: &ServiceInfo, ty_domain: &str) -> ResolvedService {
    let addresses = info.get_addresses();
    let host = addresses
        .iter()
        .copied()
        .find(IpAddr::is_ipv4)
        .or_else(|| addresses.iter().copied().next());

    let attributes = info
        .get_properties()
        .iter()
        .map(|p| (p.key().to_string(), p.val_str().to_string()))
        .collect();

    ResolvedService {
        instance_name: instance_from_fullname(info.get_fullname(), ty_domain).to_string(),
        host,
        port: info.get_port(),
        attributes,
    }
}

impl ServiceDiscoveryPort for MdnsServiceDiscovery {
    fn register_service(
        &self,
        registration: ServiceRegistration,
        listener: Arc<dyn RegistrationListener>,
    ) -> Result<RegistrationHandle, ServiceDiscoveryError> {
        let ty = ty_domain(&registration.service_type);
        let info = ServiceInfo::new(
            &ty,
            &registration.instance_name,
            &host_name(&registration.instance_name),
            "",
            registration.port,
            registration.attributes,
        )
        .map_err(|e| ServiceDiscoveryError::Registration(e.to_string()))?
        .enable_addr_auto();

        let fullname = info.get_fullname().to_string();
        let handle = RegistrationHandle(self.next_handle());

        match self.daemon.register(info) {
            Ok(()) => {
                lock(&self.registrations).insert(handle, fullname);
                listener.on_registered(&registration.instance_name);
            }
            Err(e) => {
                listener.on_registration_failed(ServiceDiscoveryError::Registration(e.to_string()))
            }
        }
        Ok(handle)
    }

    fn unregister_service(&self, handle: RegistrationHandle) {
        let Some(fullname) = lock(&self.registrations).remove(&handle) else {
            return;
        };
        match self.daemon.unregister(&fullname) {
            Ok(_status) => debug!(fullname = %fullname, "Unregistered service"),
            Err(e) => warn!(fullname = %fullname, error = %e, "Failed to unregister service"),
        }
    }

    fn discover_services(
        &self,
        service_type: &str,
        listener: Arc<dyn DiscoveryListener>,
    ) -> Result<DiscoveryHandle, ServiceDiscoveryError> {
        let ty = ty_domain(service_type);
        let receiver = self
            .daemon
            .browse(&ty)
            .map_err(|e| ServiceDiscoveryError::Discovery(e.to_string()))?;

        let handle = DiscoveryHandle(self.next_handle());
        lock(&self.browses).insert(handle, ty.clone());

        let resolved = self.resolved.clone();
        let spawned = thread::Builder::new()
            .name("mdns-browse".to_string())
            .spawn(move || {
                let mut started = false;
                while let Ok(event) = receiver.recv() {
                    match event {
                        ServiceEvent::SearchStarted(_) => {
                            // Re-sent with every query; report once.
                            if !started {
                                started = true;
                                listener.on_discovery_started(&ty);
                            }
                        }
                        ServiceEvent::ServiceFound(_, fullname) => {
                            debug!(fullname = %fullname, "Service found, awaiting resolution");
                        }
                        ServiceEvent::ServiceResolved(info) => {
                            let service = to_resolved(&info, &ty);
                            let advertisement = lock(&resolved).apply_resolved(&ty, service);
                            listener.on_service_found(advertisement);
                        }
                        ServiceEvent::ServiceRemoved(_, fullname) => {
                            let instance = instance_from_fullname(&fullname, &ty);
                            let advertisement = lock(&resolved).apply_removed(&ty, instance);
                            listener.on_service_lost(advertisement);
                        }
                        ServiceEvent::SearchStopped(_) => break,
                        _ => {}
                    }
                }
                debug!(service_type = %ty, "Browse loop finished");
            });

        if let Err(e) = spawned {
            lock(&self.browses).remove(&handle);
            let _ = self.daemon.stop_browse(&ty_domain(service_type));
            return Err(ServiceDiscoveryError::Platform(format!(
                "failed to spawn browse thread: {e}"
            )));
        }

        info!(service_type = %service_type, ?handle, "Browsing for services");
        Ok(handle)
    }

    fn stop_service_discovery(&self, handle: DiscoveryHandle) {
        let Some(ty) = lock(&self.browses).remove(&handle) else {
            return;
        };
        if let Err(e) = self.daemon.stop_browse(&ty) {
            warn!(service_type = %ty, error = %e, "Failed to stop browsing");
        }
        lock(&self.resolved).clear();
    }

    fn resolve_service(&self, service: ServiceAdvertisement, listener: Arc<dyn ResolveListener>) {
        let cached = lock(&self.resolved).get(&service.instance_name).cloned();
        match cached {
            Some(resolved) => listener.on_resolved(resolved),
            None => listener.on_resolve_failed(
                service,
                ServiceDiscoveryError::Resolve("instance not resolved".to_string()),
            ),
        }
    }
}
