use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use ir_core::discovery::{attributes_for, ATTR_DEVICE_ID, ATTR_DEVICE_NAME};
use ir_core::ports::{
    ReachabilityPort, ResolvedService, ServiceAdvertisement, ServiceDiscoveryError,
};
use ir_core::{DeviceId, DeviceInfo, DeviceType};

use super::stub_port::{Answer, StubDiscoveryPort};
use super::{DiscoveryError, DiscoveryService, DiscoverySettings};

mock! {
    pub Reachability {}

    #[async_trait]
    impl ReachabilityPort for Reachability {
        async fn probe(&self, addr: SocketAddr, timeout: Duration) -> bool;
    }
}

const SERVICE_TYPE: &str = "_ireader-sync._tcp";

fn settings() -> DiscoverySettings {
    DiscoverySettings {
        restart_delay: Duration::ZERO,
        ..DiscoverySettings::default()
    }
}

fn service(port: &Arc<StubDiscoveryPort>) -> DiscoveryService {
    DiscoveryService::new(port.clone(), Arc::new(MockReachability::new()), settings())
}

fn device(id: &str, name: &str, last_octet: u8) -> DeviceInfo {
    DeviceInfo {
        device_id: DeviceId::from(id),
        device_name: name.to_string(),
        device_type: DeviceType::Android,
        app_version: "1.4.0".to_string(),
        ip_address: IpAddr::V4(Ipv4Addr::new(192, 168, 1, last_octet)),
        port: 8443,
        last_seen: Utc::now(),
    }
}

fn instance(info: &DeviceInfo) -> String {
    format!("IReader-{}", info.device_name)
}

fn advertisement(info: &DeviceInfo) -> ServiceAdvertisement {
    ServiceAdvertisement {
        service_type: format!("{SERVICE_TYPE}.local."),
        instance_name: instance(info),
        attributes: attributes_for(info),
    }
}

/// Make `info` resolvable through the stub and announce it.
fn announce(port: &StubDiscoveryPort, info: &DeviceInfo) {
    port.set_resolution(
        &instance(info),
        Ok(ResolvedService {
            instance_name: instance(info),
            host: Some(info.ip_address),
            port: info.port,
            attributes: attributes_for(info),
        }),
    );
    port.emit_found(advertisement(info));
}

fn discovered_ids(service: &DiscoveryService) -> Vec<String> {
    service
        .discovered_devices()
        .into_iter()
        .map(|d| d.device_info.device_id.to_string())
        .collect()
}

// ---------------------------------------------------------------- broadcasting

#[tokio::test]
async fn start_broadcasting_registers_advertisement() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    let local = device("local", "Pixel", 2);

    service.start_broadcasting(local.clone()).await.unwrap();

    let registrations = port.registrations();
    assert_eq!(registrations.len(), 1);
    let (_, registration) = &registrations[0];
    assert_eq!(registration.service_type, SERVICE_TYPE);
    assert_eq!(registration.instance_name, "IReader-Pixel");
    assert_eq!(registration.port, 8443);
    assert_eq!(registration.attributes, attributes_for(&local));
    assert!(service.is_broadcasting());
    assert_eq!(service.local_device_id(), Some(DeviceId::from("local")));
}

#[tokio::test]
async fn start_broadcasting_reports_platform_failures() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);

    port.answer_registrations(Answer::Fail);
    assert!(matches!(
        service.start_broadcasting(device("l", "A", 2)).await,
        Err(DiscoveryError::RegistrationFailed(_))
    ));

    port.answer_registrations(Answer::Reject);
    assert!(matches!(
        service.start_broadcasting(device("l", "A", 2)).await,
        Err(DiscoveryError::RegistrationFailed(_))
    ));

    port.answer_registrations(Answer::Drop);
    assert_eq!(
        service.start_broadcasting(device("l", "A", 2)).await,
        Err(DiscoveryError::Cancelled)
    );

    assert!(!service.is_broadcasting());
}

#[tokio::test]
async fn restarting_broadcast_unregisters_previous_advertisement() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);

    service.start_broadcasting(device("l", "A", 2)).await.unwrap();
    service.start_broadcasting(device("l", "B", 2)).await.unwrap();

    let registrations = port.registrations();
    assert_eq!(registrations.len(), 2);
    assert_eq!(port.unregistered(), vec![registrations[0].0]);
}

#[tokio::test]
async fn stop_broadcasting_is_idempotent() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);

    service.stop_broadcasting();
    assert!(port.unregistered().is_empty());

    service.start_broadcasting(device("l", "A", 2)).await.unwrap();
    service.stop_broadcasting();
    service.stop_broadcasting();

    assert_eq!(port.unregistered().len(), 1);
    assert!(!service.is_broadcasting());
}

#[tokio::test]
async fn dropping_pending_broadcast_withdraws_registration() {
    let port = StubDiscoveryPort::new();
    port.answer_registrations(Answer::Pending);
    let service = service(&port);

    tokio::select! {
        _ = service.start_broadcasting(device("l", "A", 2)) => panic!("registration never confirmed"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }

    let registrations = port.registrations();
    assert_eq!(registrations.len(), 1);
    assert_eq!(port.unregistered(), vec![registrations[0].0]);
    assert!(!service.is_broadcasting());
}

#[tokio::test]
async fn late_confirmed_broadcast_unregisters_the_one_it_replaces() {
    let port = StubDiscoveryPort::new();
    port.answer_registrations(Answer::Pending);
    let service = service(&port);

    let first = service.start_broadcasting(device("l", "A", 2));
    let second = async {
        while port.registrations().is_empty() {
            tokio::task::yield_now().await;
        }
        port.answer_registrations(Answer::Succeed);
        service.start_broadcasting(device("l", "B", 2)).await.unwrap();
        port.confirm_pending_registrations();
    };
    let (first, ()) = tokio::join!(first, second);
    first.unwrap();

    let registrations = port.registrations();
    assert_eq!(registrations.len(), 2);
    assert_eq!(port.unregistered(), vec![registrations[1].0]);
    assert!(service.is_broadcasting());
}

// ------------------------------------------------------------------- discovery

#[tokio::test]
async fn found_services_are_resolved_into_registry() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_discovery().await.unwrap();

    let peer = device("peer-1", "Tablet", 30);
    announce(&port, &peer);

    let devices = service.discovered_devices();
    assert_eq!(devices.len(), 1);
    assert!(devices[0].is_reachable);
    assert_eq!(devices[0].device_info.socket_addr(), peer.socket_addr());
    assert_eq!(port.resolve_calls(), vec!["IReader-Tablet".to_string()]);
}

#[tokio::test]
async fn own_advertisement_is_filtered_even_after_broadcast_stops() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    let local = device("local", "Pixel", 2);

    service.start_broadcasting(local.clone()).await.unwrap();
    service.start_discovery().await.unwrap();
    announce(&port, &local);
    assert!(service.discovered_devices().is_empty());

    service.stop_broadcasting();
    announce(&port, &local);
    assert!(service.discovered_devices().is_empty());
}

#[tokio::test]
async fn preset_local_id_filters_before_broadcasting() {
    let port = StubDiscoveryPort::new();
    let service = service(&port).with_local_device_id(DeviceId::from("local"));
    service.start_discovery().await.unwrap();

    announce(&port, &device("local", "Pixel", 2));
    announce(&port, &device("peer", "Tablet", 3));

    assert_eq!(discovered_ids(&service), vec!["peer"]);
}

#[tokio::test]
async fn lost_services_remove_by_device_id() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_discovery().await.unwrap();

    let a = device("a", "Alpha", 10);
    let b = device("b", "Beta", 11);
    announce(&port, &a);
    announce(&port, &b);

    let mut anonymous = advertisement(&a);
    anonymous.attributes.remove(ATTR_DEVICE_ID);
    port.emit_lost(anonymous);
    assert_eq!(discovered_ids(&service), vec!["a", "b"]);

    port.emit_lost(advertisement(&a));
    assert_eq!(discovered_ids(&service), vec!["b"]);
}

#[tokio::test]
async fn unresolvable_or_partial_services_are_skipped() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_discovery().await.unwrap();

    let broken = device("x", "Broken", 40);
    port.set_resolution(
        &instance(&broken),
        Err(ServiceDiscoveryError::Resolve("timeout".to_string())),
    );
    port.emit_found(advertisement(&broken));

    let partial = device("y", "Partial", 41);
    let mut attributes: HashMap<String, String> = attributes_for(&partial);
    attributes.remove(ATTR_DEVICE_NAME);
    port.set_resolution(
        &instance(&partial),
        Ok(ResolvedService {
            instance_name: instance(&partial),
            host: Some(partial.ip_address),
            port: partial.port,
            attributes,
        }),
    );
    port.emit_found(advertisement(&partial));

    assert!(service.discovered_devices().is_empty());
}

#[tokio::test]
async fn services_of_other_types_are_not_resolved() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_discovery().await.unwrap();

    let mut other = advertisement(&device("p", "Printer", 9));
    other.service_type = "_ipp._tcp.local.".to_string();
    port.emit_found(other);

    assert!(port.resolve_calls().is_empty());
}

#[tokio::test]
async fn start_discovery_failure_is_reported_and_session_stopped() {
    let port = StubDiscoveryPort::new();
    port.answer_discovery(Answer::Fail);
    let service = service(&port);

    assert!(matches!(
        service.start_discovery().await,
        Err(DiscoveryError::DiscoveryStartFailed(_))
    ));
    assert_eq!(port.stopped(), port.discovery_handles());
    assert!(!service.is_discovering());

    port.answer_discovery(Answer::Reject);
    assert!(matches!(
        service.start_discovery().await,
        Err(DiscoveryError::DiscoveryStartFailed(_))
    ));
}

#[tokio::test]
async fn restarting_discovery_stops_previous_session_and_clears() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);

    service.start_discovery().await.unwrap();
    let first_listener = port.latest_listener();
    announce(&port, &device("a", "Alpha", 10));
    assert_eq!(service.discovered_devices().len(), 1);

    service.start_discovery().await.unwrap();
    let handles = port.discovery_handles();
    assert_eq!(handles.len(), 2);
    assert_eq!(port.stopped(), vec![handles[0]]);
    assert!(service.discovered_devices().is_empty());

    // Late callbacks from the replaced session are ignored.
    first_listener.on_service_found(advertisement(&device("a", "Alpha", 10)));
    assert!(service.discovered_devices().is_empty());
}

#[tokio::test]
async fn dropping_pending_discovery_stops_platform_session() {
    let port = StubDiscoveryPort::new();
    port.answer_discovery(Answer::Pending);
    let service = service(&port);

    tokio::select! {
        _ = service.start_discovery() => panic!("discovery never started"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }

    assert_eq!(port.stopped(), port.discovery_handles());
    assert!(!service.is_discovering());
}

#[tokio::test]
async fn cancelled_discovery_ignores_late_callbacks() {
    let port = StubDiscoveryPort::new();
    port.answer_discovery(Answer::Pending);
    let service = service(&port);

    tokio::select! {
        _ = service.start_discovery() => panic!("discovery never started"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }

    // The platform only answers after the caller gave up.
    port.latest_listener()
        .on_discovery_started("_ireader-sync._tcp.local.");
    announce(&port, &device("peer-1", "Tablet", 30));

    assert!(service.discovered_devices().is_empty());
    assert!(!service.is_discovering());
}

#[tokio::test]
async fn dropped_discovery_listener_is_cancellation() {
    let port = StubDiscoveryPort::new();
    port.answer_discovery(Answer::Drop);
    let service = service(&port);

    assert_eq!(
        service.start_discovery().await,
        Err(DiscoveryError::Cancelled)
    );
}

#[tokio::test]
async fn stop_discovery_clears_registry_and_is_idempotent() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_discovery().await.unwrap();
    announce(&port, &device("a", "Alpha", 10));

    service.stop_discovery();
    service.stop_discovery();

    assert_eq!(port.stopped().len(), 1);
    assert!(service.discovered_devices().is_empty());
    assert!(!service.is_discovering());
}

#[tokio::test]
async fn observers_receive_independent_snapshots() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    let mut first = service.observe_discovered_devices();
    let mut second = service.observe_discovered_devices();
    service.start_discovery().await.unwrap();

    announce(&port, &device("a", "Alpha", 10));

    first.changed().await.unwrap();
    assert_eq!(first.borrow_and_update().len(), 1);
    second.changed().await.unwrap();
    assert_eq!(second.borrow_and_update().len(), 1);
}

// ---------------------------------------------------------- probing / refresh

#[tokio::test]
async fn verify_device_checks_endpoint_with_configured_timeout() {
    let port = StubDiscoveryPort::new();
    let peer = device("p", "Tablet", 30);
    let expected_addr = peer.socket_addr();

    let mut reachability = MockReachability::new();
    reachability
        .expect_probe()
        .withf(move |addr, timeout| *addr == expected_addr && *timeout == Duration::from_secs(5))
        .times(1)
        .returning(|_, _| false);

    let service = DiscoveryService::new(port.clone(), Arc::new(reachability), settings());

    assert!(!service.verify_device(&peer).await);
}

#[tokio::test]
async fn force_refresh_restarts_active_sessions() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_broadcasting(device("l", "Local", 2)).await.unwrap();
    service.start_discovery().await.unwrap();
    announce(&port, &device("a", "Alpha", 10));

    service.force_refresh().await.unwrap();

    assert_eq!(port.discover_calls(), 2);
    assert_eq!(port.registrations().len(), 2);
    assert_eq!(port.unregistered().len(), 1);
    assert!(service.discovered_devices().is_empty());
    assert!(service.is_broadcasting());
    assert!(service.is_discovering());
}

#[tokio::test]
async fn force_refresh_when_idle_only_clears() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);

    service.force_refresh().await.unwrap();

    assert_eq!(port.discover_calls(), 0);
    assert!(port.registrations().is_empty());
}

#[tokio::test]
async fn network_change_drops_stale_peers_and_restarts_discovery() {
    let port = StubDiscoveryPort::new();
    let service = service(&port);
    service.start_discovery().await.unwrap();
    announce(&port, &device("a", "Alpha", 10));

    service.handle_network_changed().await.unwrap();

    assert!(service.discovered_devices().is_empty());
    assert_eq!(port.discover_calls(), 2);
    assert!(service.is_discovering());
}
