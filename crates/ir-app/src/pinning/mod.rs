//! Per-device certificate pinning.

mod manager;

pub use manager::{CertificatePinningManager, PinningError};
