//! Zeroizing wrappers around symmetric key material.

use rand::RngCore;
use zeroize::Zeroize;

/// Length of a content key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// The per-secret symmetric content key.
///
/// Minted once when a secret is created and reused — unmodified — across
/// every subsequent version and every grant.  The wrapper zeroes its
/// memory when dropped so the key cannot linger after an operation
/// exits, on any exit path.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct ContentKey {
    bytes: [u8; KEY_LEN],
}

impl ContentKey {
    /// Generate a fresh random 256-bit content key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap raw key bytes (e.g. the output of an unwrap operation).
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to pass to `seal` or `wrap`).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}
