//! Pinned fingerprint persistence.

mod file_store;
mod memory_store;

pub use file_store::FilePinnedFingerprintStore;
pub use memory_store::InMemoryPinnedFingerprintStore;
