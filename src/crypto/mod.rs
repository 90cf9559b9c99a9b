//! Cryptographic primitives for Sealbox.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with an explicit tag (`cipher`)
//! - Argon2id password-based key derivation (`kdf`)
//! - Zeroizing content-key wrappers (`keys`)
//! - RSA-OAEP content-key wrapping for sharing (`wrap`)

pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod wrap;

// Re-export the most commonly used items so callers can write:
//   use sealbox::crypto::{seal, open, derive_key, ...};
pub use cipher::{open, seal, SealedParts};
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use keys::ContentKey;
pub use wrap::{generate_keypair, unwrap_content_key, wrap_content_key, KeyPairPem};
