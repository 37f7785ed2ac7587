use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

/// Transport capability of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Wifi,
    Ethernet,
    Cellular,
    Vpn,
}

/// A network the process could bind its sockets to.
///
/// On desktop this is one OS interface (e.g. `wlan0`, `en0`, `Wi-Fi`) with
/// all of its addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCandidate {
    pub name: String,
    pub addresses: Vec<IpAddr>,
    pub transports: BTreeSet<Transport>,
}

impl NetworkCandidate {
    pub fn new(name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            name: name.into(),
            addresses,
            transports: BTreeSet::new(),
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transports.insert(transport);
        self
    }

    pub fn has_transport(&self, transport: Transport) -> bool {
        self.transports.contains(&transport)
    }

    pub fn is_wifi(&self) -> bool {
        self.has_transport(Transport::Wifi)
    }

    pub fn is_vpn(&self) -> bool {
        self.has_transport(Transport::Vpn)
    }

    /// First IPv4 address, falling back to the first address of any family.
    pub fn primary_address(&self) -> Option<IpAddr> {
        self.addresses
            .iter()
            .copied()
            .find(IpAddr::is_ipv4)
            .or_else(|| self.addresses.first().copied())
    }
}

impl fmt::Display for NetworkCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(addr) = self.primary_address() {
            write!(f, " ({addr})")?;
        }
        Ok(())
    }
}
