//! Device domain models.

pub mod device_info;
pub mod device_type;
pub mod discovered;

pub use device_info::DeviceInfo;
pub use device_type::DeviceType;
pub use discovered::DiscoveredDevice;
