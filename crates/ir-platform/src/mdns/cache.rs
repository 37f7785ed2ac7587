use std::collections::HashMap;

use ir_core::ports::{ResolvedService, ServiceAdvertisement};

/// Resolved services by instance name.
///
/// mDNS removal events only carry the full name; the cache supplies the TXT
/// attributes a lost advertisement needs to identify its device.
#[derive(Debug, Default)]
pub struct ResolvedCache {
    services: HashMap<String, ResolvedService>,
}

impl ResolvedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, instance_name: &str) -> Option<&ResolvedService> {
        self.services.get(instance_name)
    }

    /// Record a resolution and produce the matching "found" advertisement.
    pub fn apply_resolved(
        &mut self,
        service_type: &str,
        service: ResolvedService,
    ) -> ServiceAdvertisement {
        let advertisement = ServiceAdvertisement {
            service_type: service_type.to_string(),
            instance_name: service.instance_name.clone(),
            attributes: service.attributes.clone(),
        };
        self.services
            .insert(service.instance_name.clone(), service);
        advertisement
    }

    /// Forget an instance and produce the "lost" advertisement, carrying the
    /// last known attributes if the instance was ever resolved.
    pub fn apply_removed(&mut self, service_type: &str, instance_name: &str) -> ServiceAdvertisement {
        let attributes = self
            .services
            .remove(instance_name)
            .map(|s| s.attributes)
            .unwrap_or_default();
        ServiceAdvertisement {
            service_type: service_type.to_string(),
            instance_name: instance_name.to_string(),
            attributes,
        }
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }
}

/// `IReader-Pixel._ireader-sync._tcp.local.` → `IReader-Pixel`
pub fn instance_from_fullname<'a>(fullname: &'a str, ty_domain: &str) -> &'a str {
    fullname
        .strip_suffix(ty_domain)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(fullname)
}
