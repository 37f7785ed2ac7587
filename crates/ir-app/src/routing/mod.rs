//! Process network binding for LAN sync.

mod configurator;

pub use configurator::{BindingState, NetworkRoutingConfigurator};
