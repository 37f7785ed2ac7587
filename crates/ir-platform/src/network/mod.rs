//! Desktop network enumeration and interface-bound sockets.

mod binder;
mod connector;
mod interfaces;

pub use binder::SocketBindingNetworkAdapter;
pub use connector::{BoundInterface, BoundSocketConnector};
pub use interfaces::{
    classify_interfaces, is_clash_tun_address, is_tunnel_interface, is_wifi_interface,
    list_networks, InterfaceAddress,
};
