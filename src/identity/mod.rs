//! Per-user asymmetric identities and password custody of the private key.
//!
//! Each user gets one RSA keypair at registration.  The public half is
//! stored in the clear; the private half only ever persists inside a
//! password-protected `EncryptedBlob` (Argon2id-derived key + AES-GCM).
//! The server holding the bundle can never recover the private key
//! without the user's password.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::blob::EncryptedBlob;
use crate::config::CoreConfig;
use crate::crypto::cipher;
use crate::crypto::kdf::{self, KdfParams};
use crate::crypto::wrap;
use crate::errors::{Result, SealboxError};

/// A user's cryptographic identity.
///
/// `public_key` is immutable after creation.  `private_key_bundle` is
/// the colon-delimited base64 wire form of an `EncryptedBlob` — the
/// only representation of the private key that may ever be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Collaborator-assigned user id.
    pub id: String,

    /// SPKI PEM public key.
    pub public_key: String,

    /// Password-protected private key, in blob wire form.
    pub private_key_bundle: String,

    pub created_at: DateTime<Utc>,
}

/// Mint a fresh identity for `user_id`, protecting the private key
/// under `password`.
///
/// The plaintext private key exists only inside this function; the
/// returned record carries the protected bundle.
pub fn generate_identity(user_id: &str, password: &str, config: &CoreConfig) -> Result<Identity> {
    let pair = wrap::generate_keypair(config.rsa_bits)?;
    let bundle = protect_private_key(&pair.private_pem, password, &config.kdf_params())?;

    Ok(Identity {
        id: user_id.to_string(),
        public_key: pair.public_pem,
        private_key_bundle: bundle.encode(),
        created_at: Utc::now(),
    })
}

/// Seal a plaintext private key under a password.
///
/// Draws a fresh random salt, derives the key via Argon2id, and seals
/// with AES-GCM.  The salt travels inside the returned blob so the
/// password is the only input needed to unlock.
pub fn protect_private_key(
    private_key_pem: &str,
    password: &str,
    params: &KdfParams,
) -> Result<EncryptedBlob> {
    let salt = kdf::generate_salt();
    let key = Zeroizing::new(kdf::derive_key(password.as_bytes(), &salt, params)?);

    let sealed = cipher::seal(key.as_slice(), private_key_pem.as_bytes())?;

    Ok(EncryptedBlob::with_salt(salt, sealed))
}

/// Recover the plaintext private key from a bundle.
///
/// Every failure mode — wrong password, tampered blob, malformed
/// encoding — surfaces as the single `Authentication` error.  The
/// caller must not be able to distinguish cause.
pub fn unlock_private_key(
    bundle: &str,
    password: &str,
    params: &KdfParams,
) -> Result<Zeroizing<String>> {
    let blob = EncryptedBlob::decode(bundle).map_err(|_| SealboxError::Authentication)?;
    if blob.salt.is_empty() {
        return Err(SealboxError::Authentication);
    }

    let key = Zeroizing::new(
        kdf::derive_key(password.as_bytes(), &blob.salt, params)
            .map_err(|_| SealboxError::Authentication)?,
    );

    let pem_bytes = cipher::open(key.as_slice(), &blob.nonce, &blob.ciphertext, &blob.tag)
        .map_err(|_| SealboxError::Authentication)?;

    let pem = std::str::from_utf8(&pem_bytes).map_err(|_| SealboxError::Authentication)?;
    Ok(Zeroizing::new(pem.to_string()))
}

/// Re-encrypt a private-key bundle under a new password.
///
/// Used when the user changes their password.  Unlocks with the old
/// password, draws a fresh salt and nonce, and seals again.  The
/// underlying keypair is unchanged — existing grants stay valid.
pub fn reprotect_private_key(
    bundle: &str,
    old_password: &str,
    new_password: &str,
    params: &KdfParams,
) -> Result<String> {
    let private_pem = unlock_private_key(bundle, old_password, params)?;
    let reprotected = protect_private_key(&private_pem, new_password, params)?;
    Ok(reprotected.encode())
}
