pub mod lan_sync;
pub mod secure_channel;

pub use lan_sync::{LanSyncSession, LanSyncStatus};
pub use secure_channel::{SecureChannelError, SecureChannelFactory};
