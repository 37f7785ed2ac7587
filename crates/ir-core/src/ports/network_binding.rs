use thiserror::Error;

use crate::network::NetworkCandidate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkBindingError {
    #[error("failed to enumerate networks: {0}")]
    Enumeration(String),

    #[error("platform rejected binding to {network}: {reason}")]
    BindRejected { network: String, reason: String },

    #[error("network binding platform error: {0}")]
    Platform(String),
}

/// Process-wide network selection.
pub trait NetworkBindingPort: Send + Sync {
    /// Networks currently up, with their transport capabilities.
    fn active_networks(&self) -> Result<Vec<NetworkCandidate>, NetworkBindingError>;

    /// Route subsequently created sockets through `network`.
    fn bind_process_to_network(&self, network: &NetworkCandidate)
        -> Result<(), NetworkBindingError>;

    /// Restore default routing.
    fn clear_process_binding(&self) -> Result<(), NetworkBindingError>;
}
