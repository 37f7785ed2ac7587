//! DNS-SD over multicast DNS, backed by `mdns-sd`.

mod cache;
mod daemon;

pub use cache::{instance_from_fullname, ResolvedCache};
pub use daemon::MdnsServiceDiscovery;
