pub mod audit;
pub mod blob;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod identity;
pub mod vault;
