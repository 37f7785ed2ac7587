use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Service registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Service discovery failed to start: {0}")]
    DiscoveryStartFailed(String),

    /// The platform dropped its listener without ever answering.
    #[error("Discovery operation cancelled before completion")]
    Cancelled,

    #[error("Discovery platform error: {0}")]
    Platform(String),
}
