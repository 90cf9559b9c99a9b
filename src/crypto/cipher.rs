//! AES-256-GCM authenticated encryption with an explicit auth tag.
//!
//! Each call to `seal` generates a fresh random 12-byte nonce — a nonce
//! is never reused under the same key.  The 16-byte GCM tag is split off
//! the ciphertext tail so that nonce, ciphertext and tag can be stored
//! as separate fields of an `EncryptedBlob`.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::errors::{Result, SealboxError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Output of a single `seal` call.
#[derive(Debug, Clone)]
pub struct SealedParts {
    /// The random nonce generated for this encryption.
    pub nonce: [u8; NONCE_LEN],
    /// The ciphertext without the tag.
    pub ciphertext: Vec<u8>,
    /// The GCM authentication tag over the ciphertext.
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` with a 32-byte `key`.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<SealedParts> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SealboxError::EncryptionFailed(format!("invalid key length: {e}")))?;

    // Fresh random 12-byte nonce for every call.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| SealboxError::EncryptionFailed(format!("encryption error: {e}")))?;

    // The AEAD output is ciphertext || tag; split the 16-byte tail off.
    let tag_tail = ciphertext.split_off(ciphertext.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&tag_tail);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&nonce);

    Ok(SealedParts {
        nonce: nonce_bytes,
        ciphertext,
        tag,
    })
}

/// Decrypt data that was produced by `seal`.
///
/// Any failure — wrong key, tampered ciphertext, tampered nonce or tag —
/// is reported as the single generic `Decrypt` error so the caller
/// cannot distinguish causes.
pub fn open(key: &[u8], nonce: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(SealboxError::Decrypt);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealboxError::Decrypt)?;

    // Re-join ciphertext and tag for the AEAD API.
    let mut joined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    joined.extend_from_slice(ciphertext);
    joined.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), joined.as_slice())
        .map_err(|_| SealboxError::Decrypt)?;

    Ok(Zeroizing::new(plaintext))
}
