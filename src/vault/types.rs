//! Persistent records of the vault core.
//!
//! These are the opaque blobs the surrounding application stores and
//! hands back: the core never sees a database, only these values.
//! Byte fields use custom serde helpers so they serialize as base64
//! strings in JSON rather than raw byte arrays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blob::{base64_decode, base64_encode, EncryptedBlob};

/// A secret's metadata. The content itself lives in
/// `SecretContentVersion` rows; this record never holds plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,

    /// Soft-delete flag. Deletion never erases or re-keys ciphertext;
    /// the surrounding query layer must exclude flagged secrets.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
}

/// One encrypted version of a secret's content.
///
/// `version_number` increases monotonically per secret, starting at 1.
/// Every version of a secret is sealed under the same content key, so
/// the payload blob carries no salt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretContentVersion {
    pub id: String,
    pub secret_id: String,
    pub version_number: u32,
    pub payload: EncryptedBlob,
    pub created_at: DateTime<Utc>,
}

/// One user's wrapped copy of a secret's content key.
///
/// All grants of a secret wrap the identical content key, each under
/// that user's public key — this is what allows sharing without
/// re-encrypting content.  Exactly one grant may exist per
/// (secret, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub secret_id: String,
    pub user_id: String,

    /// The content key, RSA-OAEP-wrapped under this user's public key.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_content_key: Vec<u8>,

    pub granted_at: DateTime<Utc>,
}
