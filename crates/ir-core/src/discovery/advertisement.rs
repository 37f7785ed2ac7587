//! Advertisement metadata codec.
//!
//! 服务广播元数据的编码与解析。
//!
//! A peer advertises one DNS-SD service instance:
//!
//! ```text
//! type:      _ireader-sync._tcp
//! instance:  IReader-<deviceName>
//! port:      <DeviceInfo.port>
//! TXT:       deviceId=<id> deviceName=<name> deviceType=<ANDROID|IOS|DESKTOP|UNKNOWN> appVersion=<ver>
//! ```
//!
//! Resolution is all-or-nothing: a record missing any of the four keys or a
//! host address never becomes a [`DiscoveredDevice`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;

use crate::device::{DeviceInfo, DeviceType, DiscoveredDevice};
use crate::ids::DeviceId;

pub const SERVICE_TYPE: &str = "_ireader-sync._tcp";
pub const SERVICE_NAME_PREFIX: &str = "IReader";

pub const ATTR_DEVICE_ID: &str = "deviceId";
pub const ATTR_DEVICE_NAME: &str = "deviceName";
pub const ATTR_DEVICE_TYPE: &str = "deviceType";
pub const ATTR_APP_VERSION: &str = "appVersion";

/// `<prefix>-<deviceName>`
pub fn instance_name(prefix: &str, device_name: &str) -> String {
    format!("{prefix}-{device_name}")
}

/// TXT attributes describing `info`.
pub fn attributes_for(info: &DeviceInfo) -> HashMap<String, String> {
    HashMap::from([
        (ATTR_DEVICE_ID.to_string(), info.device_id.to_string()),
        (ATTR_DEVICE_NAME.to_string(), info.device_name.clone()),
        (
            ATTR_DEVICE_TYPE.to_string(),
            info.device_type.as_str().to_string(),
        ),
        (ATTR_APP_VERSION.to_string(), info.app_version.clone()),
    ])
}

/// Device id carried by an advertisement, if any.
pub fn device_id_from_attributes(attributes: &HashMap<String, String>) -> Option<DeviceId> {
    non_blank(attributes, ATTR_DEVICE_ID).map(DeviceId::from)
}

/// Build a [`DiscoveredDevice`] from a resolved advertisement.
///
/// Returns `None` when any required attribute or the host address is
/// missing. Unknown attributes are ignored; an unrecognized device type
/// becomes [`DeviceType::Unknown`].
pub fn parse_resolved(
    attributes: &HashMap<String, String>,
    host: Option<IpAddr>,
    port: u16,
    now: DateTime<Utc>,
) -> Option<DiscoveredDevice> {
    let device_id = device_id_from_attributes(attributes);
    let device_name = non_blank(attributes, ATTR_DEVICE_NAME);
    let device_type = non_blank(attributes, ATTR_DEVICE_TYPE);
    let app_version = non_blank(attributes, ATTR_APP_VERSION);

    let (Some(device_id), Some(device_name), Some(device_type), Some(app_version), Some(ip)) =
        (device_id, device_name, device_type, app_version, host)
    else {
        debug!(
            has_host = host.is_some(),
            keys = ?attributes.keys().collect::<Vec<_>>(),
            "Discarding partially resolved advertisement"
        );
        return None;
    };

    let info = DeviceInfo {
        device_id,
        device_name: device_name.to_string(),
        device_type: DeviceType::parse_lenient(device_type),
        app_version: app_version.to_string(),
        ip_address: ip,
        port,
        last_seen: now,
    };

    Some(DiscoveredDevice::resolved(info, now))
}

fn non_blank<'a>(attributes: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}
