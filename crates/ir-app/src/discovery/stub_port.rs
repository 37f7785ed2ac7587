//! Recording [`ServiceDiscoveryPort`] for tests.
//!
//! Listeners are always invoked with the stub's lock released, so callbacks
//! may re-enter the port the way real platform stacks allow.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ir_core::ports::{
    DiscoveryHandle, DiscoveryListener, RegistrationHandle, RegistrationListener,
    ResolveListener, ResolvedService, ServiceAdvertisement, ServiceDiscoveryError,
    ServiceDiscoveryPort, ServiceRegistration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Answer {
    /// Report success from inside the call.
    #[default]
    Succeed,
    /// Report failure through the listener.
    Fail,
    /// Return an error synchronously.
    Reject,
    /// Never answer.
    Pending,
    /// Drop the listener without answering.
    Drop,
}

#[derive(Default)]
struct State {
    next_handle: u64,
    registration_answer: Answer,
    discovery_answer: Answer,
    registrations: Vec<(RegistrationHandle, ServiceRegistration)>,
    unregistered: Vec<RegistrationHandle>,
    pending_registrations: Vec<Arc<dyn RegistrationListener>>,
    discovery_sessions: Vec<(DiscoveryHandle, Arc<dyn DiscoveryListener>)>,
    discover_calls: usize,
    stopped: Vec<DiscoveryHandle>,
    resolutions: HashMap<String, Result<ResolvedService, ServiceDiscoveryError>>,
    resolve_calls: Vec<String>,
}

#[derive(Default)]
pub(crate) struct StubDiscoveryPort {
    state: Mutex<State>,
}

impl StubDiscoveryPort {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn answer_registrations(&self, answer: Answer) {
        self.lock().registration_answer = answer;
    }

    pub(crate) fn answer_discovery(&self, answer: Answer) {
        self.lock().discovery_answer = answer;
    }

    pub(crate) fn set_resolution(
        &self,
        instance_name: &str,
        outcome: Result<ResolvedService, ServiceDiscoveryError>,
    ) {
        self.lock()
            .resolutions
            .insert(instance_name.to_string(), outcome);
    }

    /// Confirm every registration held back by [`Answer::Pending`].
    pub(crate) fn confirm_pending_registrations(&self) {
        let pending = std::mem::take(&mut self.lock().pending_registrations);
        for listener in pending {
            listener.on_registered("late");
        }
    }

    pub(crate) fn registrations(&self) -> Vec<(RegistrationHandle, ServiceRegistration)> {
        self.lock().registrations.clone()
    }

    pub(crate) fn unregistered(&self) -> Vec<RegistrationHandle> {
        self.lock().unregistered.clone()
    }

    pub(crate) fn discover_calls(&self) -> usize {
        self.lock().discover_calls
    }

    pub(crate) fn discovery_handles(&self) -> Vec<DiscoveryHandle> {
        self.lock()
            .discovery_sessions
            .iter()
            .map(|(h, _)| *h)
            .collect()
    }

    pub(crate) fn stopped(&self) -> Vec<DiscoveryHandle> {
        self.lock().stopped.clone()
    }

    pub(crate) fn resolve_calls(&self) -> Vec<String> {
        self.lock().resolve_calls.clone()
    }

    /// Listener of the most recent discovery session, even if stopped.
    pub(crate) fn latest_listener(&self) -> Arc<dyn DiscoveryListener> {
        self.lock()
            .discovery_sessions
            .last()
            .map(|(_, l)| l.clone())
            .expect("no discovery session")
    }

    pub(crate) fn emit_found(&self, service: ServiceAdvertisement) {
        self.latest_listener().on_service_found(service);
    }

    pub(crate) fn emit_lost(&self, service: ServiceAdvertisement) {
        self.latest_listener().on_service_lost(service);
    }

    fn next_handle(state: &mut State) -> u64 {
        state.next_handle += 1;
        state.next_handle
    }
}

impl ServiceDiscoveryPort for StubDiscoveryPort {
    fn register_service(
        &self,
        registration: ServiceRegistration,
        listener: Arc<dyn RegistrationListener>,
    ) -> Result<RegistrationHandle, ServiceDiscoveryError> {
        let (handle, answer, name, listener) = {
            let mut state = self.lock();
            let answer = state.registration_answer;
            if answer == Answer::Reject {
                return Err(ServiceDiscoveryError::Platform("rejected".to_string()));
            }
            let handle = RegistrationHandle(Self::next_handle(&mut state));
            let name = registration.instance_name.clone();
            state.registrations.push((handle, registration));
            if answer == Answer::Pending {
                state.pending_registrations.push(listener);
                return Ok(handle);
            }
            (handle, answer, name, listener)
        };

        match answer {
            Answer::Succeed => listener.on_registered(&name),
            Answer::Fail => listener.on_registration_failed(ServiceDiscoveryError::Registration(
                "name conflict".to_string(),
            )),
            Answer::Pending | Answer::Drop | Answer::Reject => drop(listener),
        }
        Ok(handle)
    }

    fn unregister_service(&self, handle: RegistrationHandle) {
        self.lock().unregistered.push(handle);
    }

    fn discover_services(
        &self,
        _service_type: &str,
        listener: Arc<dyn DiscoveryListener>,
    ) -> Result<DiscoveryHandle, ServiceDiscoveryError> {
        let (handle, answer) = {
            let mut state = self.lock();
            state.discover_calls += 1;
            let answer = state.discovery_answer;
            if answer == Answer::Reject {
                return Err(ServiceDiscoveryError::Platform("rejected".to_string()));
            }
            let handle = DiscoveryHandle(Self::next_handle(&mut state));
            if answer != Answer::Drop {
                state.discovery_sessions.push((handle, listener.clone()));
            }
            (handle, answer)
        };

        match answer {
            Answer::Succeed => listener.on_discovery_started("_ireader-sync._tcp.local."),
            Answer::Fail => listener.on_start_discovery_failed(ServiceDiscoveryError::Discovery(
                "multicast unavailable".to_string(),
            )),
            Answer::Pending | Answer::Drop | Answer::Reject => {}
        }
        Ok(handle)
    }

    fn stop_service_discovery(&self, handle: DiscoveryHandle) {
        self.lock().stopped.push(handle);
    }

    fn resolve_service(&self, service: ServiceAdvertisement, listener: Arc<dyn ResolveListener>) {
        let outcome = {
            let mut state = self.lock();
            state.resolve_calls.push(service.instance_name.clone());
            state.resolutions.get(&service.instance_name).cloned()
        };

        match outcome {
            Some(Ok(resolved)) => listener.on_resolved(resolved),
            Some(Err(e)) => listener.on_resolve_failed(service, e),
            None => listener.on_resolve_failed(
                service,
                ServiceDiscoveryError::Resolve("unknown instance".to_string()),
            ),
        }
    }
}
