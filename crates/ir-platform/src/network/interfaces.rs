//! Interface classification.
//!
//! 网络接口分类。
//!
//! # Rules / 规则
//! - Loopback-only and link-local-only interfaces are skipped
//! - WiFi: `wlan*`, `wlp*`, `wl*`, names containing `wifi` / `wi-fi` / `airport`, macOS `en0`
//! - VPN overlay: tunnel names (`tun`, `utun`, `tap`, `wg`, `ppp`, `ipsec`) or a
//!   Clash TUN address (198.18.0.0/15)
//! - Cellular: `rmnet*`, `wwan*`, `ccmni*`, `pdp_ip*`
//! - Everything else with a routable address counts as Ethernet

use local_ip_address::list_afinet_netifas;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

use ir_core::network::{NetworkCandidate, Transport};
use ir_core::ports::NetworkBindingError;

/// One `(interface name, address)` pair as reported by the OS.
pub type InterfaceAddress = (String, IpAddr);

/// Enumerate and classify the host's interfaces.
pub fn list_networks() -> Result<Vec<NetworkCandidate>, NetworkBindingError> {
    let interfaces =
        list_afinet_netifas().map_err(|e| NetworkBindingError::Enumeration(e.to_string()))?;
    Ok(classify_interfaces(interfaces))
}

/// Group addresses per interface (first-seen order) and attach transports.
pub fn classify_interfaces(
    interfaces: impl IntoIterator<Item = InterfaceAddress>,
) -> Vec<NetworkCandidate> {
    let mut grouped: Vec<(String, Vec<IpAddr>)> = Vec::new();
    for (name, ip) in interfaces {
        if ip.is_loopback() || is_link_local(ip) {
            continue;
        }
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, addrs)) => addrs.push(ip),
            None => grouped.push((name, vec![ip])),
        }
    }

    grouped
        .into_iter()
        .map(|(name, addresses)| {
            let candidate = classify(&name, addresses);
            debug!(interface = %candidate.name, transports = ?candidate.transports, "Classified interface");
            candidate
        })
        .collect()
}

fn classify(name: &str, addresses: Vec<IpAddr>) -> NetworkCandidate {
    let has_clash_address = addresses.iter().any(|ip| match ip {
        IpAddr::V4(v4) => is_clash_tun_address(*v4),
        IpAddr::V6(_) => false,
    });

    let mut candidate = NetworkCandidate::new(name, addresses);

    if is_tunnel_interface(name) || has_clash_address {
        candidate = candidate.with_transport(Transport::Vpn);
    }

    if is_wifi_interface(name) {
        candidate = candidate.with_transport(Transport::Wifi);
    } else if is_cellular_interface(name) {
        candidate = candidate.with_transport(Transport::Cellular);
    } else if !candidate.is_vpn() {
        candidate = candidate.with_transport(Transport::Ethernet);
    }

    candidate
}

pub fn is_wifi_interface(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("wl")
        || lower.contains("wifi")
        || lower.contains("wi-fi")
        || lower.contains("airport")
        || (cfg!(target_os = "macos") && lower == "en0")
}

pub fn is_tunnel_interface(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["utun", "tun", "tap", "wg", "ppp", "ipsec"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn is_cellular_interface(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["rmnet", "wwan", "ccmni", "pdp_ip"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Clash / mihomo TUN mode hands out addresses from 198.18.0.0/15.
pub fn is_clash_tun_address(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 198 && (octets[1] == 18 || octets[1] == 19)
}

fn is_link_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}
