//! ID type wrappers for type safety.

pub mod device_id;

pub use device_id::DeviceId;
