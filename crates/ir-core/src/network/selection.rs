use super::NetworkCandidate;

/// Pick the network LAN sync should bind to.
///
/// A WiFi network without a VPN overlay wins; a WiFi network carrying a VPN
/// is the fallback. Anything else yields `None`. Ties keep enumeration order.
pub fn select_wifi_candidate(candidates: &[NetworkCandidate]) -> Option<&NetworkCandidate> {
    candidates
        .iter()
        .find(|c| c.is_wifi() && !c.is_vpn())
        .or_else(|| candidates.iter().find(|c| c.is_wifi()))
}
