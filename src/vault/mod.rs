//! The secret vault: records, the persistence boundary, and the
//! protocol orchestration.

pub mod service;
pub mod store;
pub mod types;

pub use service::SecretVaultService;
pub use store::{MemoryVaultStore, VaultStore};
pub use types::{AccessGrant, Secret, SecretContentVersion};
