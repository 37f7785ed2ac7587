use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;

use crate::device::DiscoveredDevice;
use crate::ids::DeviceId;

/// Map of currently visible peers, re-published as a snapshot on every change.
///
/// All mutations go through one mutex; observers only ever see whole
/// snapshots sorted by device name.
#[derive(Debug)]
pub struct DiscoveryRegistry {
    devices: Mutex<HashMap<DeviceId, DiscoveredDevice>>,
    snapshot_tx: watch::Sender<Vec<DiscoveredDevice>>,
}

impl Default for DiscoveryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            devices: Mutex::new(HashMap::new()),
            snapshot_tx,
        }
    }

    /// Insert or replace the record for the device's id.
    pub fn upsert(&self, device: DiscoveredDevice) {
        self.mutate(|devices| {
            devices.insert(device.device_id().clone(), device);
            true
        });
    }

    /// Returns whether a record was removed.
    pub fn remove(&self, device_id: &DeviceId) -> bool {
        self.mutate(|devices| devices.remove(device_id).is_some())
    }

    pub fn clear(&self) {
        self.mutate(|devices| {
            let had_any = !devices.is_empty();
            devices.clear();
            had_any
        });
    }

    pub fn contains(&self, device_id: &DeviceId) -> bool {
        self.lock().contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<DiscoveredDevice> {
        self.snapshot_tx.borrow().clone()
    }

    /// New independent observer of the live snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<DiscoveredDevice>> {
        self.snapshot_tx.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DeviceId, DiscoveredDevice>> {
        // A poisoned registry still holds a consistent map; keep serving it.
        self.devices.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn mutate(&self, f: impl FnOnce(&mut HashMap<DeviceId, DiscoveredDevice>) -> bool) -> bool {
        let mut devices = self.lock();
        let changed = f(&mut devices);
        if changed {
            let mut snapshot: Vec<DiscoveredDevice> = devices.values().cloned().collect();
            snapshot.sort_by(|a, b| {
                a.device_info
                    .device_name
                    .cmp(&b.device_info.device_name)
                    .then_with(|| a.device_id().as_str().cmp(b.device_id().as_str()))
            });
            // Published while holding the lock so snapshots stay ordered.
            self.snapshot_tx.send_replace(snapshot);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceInfo, DeviceType};
    use chrono::Utc;
    use std::net::{IpAddr, Ipv4Addr};

    fn device(id: &str, name: &str) -> DiscoveredDevice {
        DiscoveredDevice::resolved(
            DeviceInfo {
                device_id: DeviceId::from(id),
                device_name: name.to_string(),
                device_type: DeviceType::Desktop,
                app_version: "1.0".to_string(),
                ip_address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
                port: 9000,
                last_seen: Utc::now(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_upsert_replaces_existing_record() {
        let registry = DiscoveryRegistry::new();
        registry.upsert(device("a", "Old"));
        registry.upsert(device("a", "New"));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].device_info.device_name, "New");
    }

    #[test]
    fn test_snapshot_is_sorted_and_remove_reports_change() {
        let registry = DiscoveryRegistry::new();
        registry.upsert(device("b", "Zeta"));
        registry.upsert(device("a", "Alpha"));

        let names: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|d| d.device_info.device_name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        assert!(registry.remove(&DeviceId::from("a")));
        assert!(!registry.remove(&DeviceId::from("a")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes_independently() {
        let registry = DiscoveryRegistry::new();
        let mut first = registry.subscribe();
        let mut second = registry.subscribe();

        registry.upsert(device("a", "Alpha"));

        first.changed().await.unwrap();
        second.changed().await.unwrap();
        assert_eq!(first.borrow_and_update().len(), 1);
        assert_eq!(second.borrow_and_update().len(), 1);

        registry.clear();
        first.changed().await.unwrap();
        assert!(first.borrow().is_empty());
        assert!(registry.is_empty());
    }
}
