use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Kind of device running the app.
///
/// Parsing never fails: peers running a newer version may advertise a type
/// this build does not know, which maps to [`DeviceType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Android,
    Ios,
    Desktop,
    #[default]
    Unknown,
}

impl DeviceType {
    /// Wire name carried in advertisement metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Android => "ANDROID",
            DeviceType::Ios => "IOS",
            DeviceType::Desktop => "DESKTOP",
            DeviceType::Unknown => "UNKNOWN",
        }
    }

    /// Lenient parse used by advertisement resolution.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ANDROID" => DeviceType::Android,
            "IOS" => DeviceType::Ios,
            "DESKTOP" => DeviceType::Desktop,
            _ => DeviceType::Unknown,
        }
    }
}

impl FromStr for DeviceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for DeviceType {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<DeviceType> for String {
    fn from(ty: DeviceType) -> Self {
        ty.as_str().to_string()
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
