//! LAN discovery domain: the advertisement wire codec and the registry of
//! currently visible peers.

pub mod advertisement;
pub mod registry;

pub use advertisement::{
    attributes_for, device_id_from_attributes, instance_name, parse_resolved, ATTR_APP_VERSION,
    ATTR_DEVICE_ID, ATTR_DEVICE_NAME, ATTR_DEVICE_TYPE, SERVICE_NAME_PREFIX, SERVICE_TYPE,
};
pub use registry::DiscoveryRegistry;
