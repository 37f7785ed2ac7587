//! Network interface models and WiFi candidate selection.

pub mod candidate;
pub mod selection;

pub use candidate::{NetworkCandidate, Transport};
pub use selection::select_wifi_candidate;
