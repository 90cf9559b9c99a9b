//! The canonical container for any password- or key-protected payload.
//!
//! An `EncryptedBlob` carries explicit salt/nonce/tag/ciphertext
//! boundaries so the on-disk form stays self-describing and
//! forward-compatible.  The wire encoding is four colon-delimited
//! base64 segments:
//!
//! ```text
//! <salt>:<nonce>:<tag>:<ciphertext>
//! ```
//!
//! Password-protected payloads (private-key bundles) carry a 16-byte
//! salt.  Key-protected payloads (secret content versions) have no
//! KDF step, so their salt segment is empty.

use serde::{Deserialize, Serialize};

use crate::crypto::cipher::{SealedParts, NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::SALT_LEN;
use crate::errors::{Result, SealboxError};

/// A self-describing encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// KDF salt (16 bytes), or empty when the key was not password-derived.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// AES-GCM nonce (12 bytes).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// GCM authentication tag (16 bytes) over the ciphertext.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub tag: Vec<u8>,

    /// The encrypted payload itself.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Build a password-protected blob from sealed parts and the KDF salt.
    pub fn with_salt(salt: [u8; SALT_LEN], parts: SealedParts) -> Self {
        Self {
            salt: salt.to_vec(),
            nonce: parts.nonce.to_vec(),
            tag: parts.tag.to_vec(),
            ciphertext: parts.ciphertext,
        }
    }

    /// Build a key-protected blob (no salt) from sealed parts.
    pub fn from_sealed(parts: SealedParts) -> Self {
        Self {
            salt: Vec::new(),
            nonce: parts.nonce.to_vec(),
            tag: parts.tag.to_vec(),
            ciphertext: parts.ciphertext,
        }
    }

    /// Serialize to the colon-delimited base64 wire form.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            BASE64.encode(&self.salt),
            BASE64.encode(&self.nonce),
            BASE64.encode(&self.tag),
            BASE64.encode(&self.ciphertext)
        )
    }

    /// Parse the colon-delimited base64 wire form.
    ///
    /// Strict: exactly four segments, valid base64, and exact salt,
    /// nonce and tag lengths.
    pub fn decode(encoded: &str) -> Result<Self> {
        let segments: Vec<&str> = encoded.split(':').collect();
        if segments.len() != 4 {
            return Err(SealboxError::InvalidBlobFormat(format!(
                "expected 4 segments, got {}",
                segments.len()
            )));
        }

        let decode_segment = |name: &str, segment: &str| -> Result<Vec<u8>> {
            BASE64
                .decode(segment)
                .map_err(|e| SealboxError::InvalidBlobFormat(format!("bad base64 in {name}: {e}")))
        };

        let blob = Self {
            salt: decode_segment("salt", segments[0])?,
            nonce: decode_segment("nonce", segments[1])?,
            tag: decode_segment("tag", segments[2])?,
            ciphertext: decode_segment("ciphertext", segments[3])?,
        };
        blob.validate()?;
        Ok(blob)
    }

    /// Check the field lengths an `EncryptedBlob` must uphold.
    pub fn validate(&self) -> Result<()> {
        if !self.salt.is_empty() && self.salt.len() != SALT_LEN {
            return Err(SealboxError::InvalidBlobFormat(format!(
                "salt must be empty or {SALT_LEN} bytes (got {})",
                self.salt.len()
            )));
        }
        if self.nonce.len() != NONCE_LEN {
            return Err(SealboxError::InvalidBlobFormat(format!(
                "nonce must be {NONCE_LEN} bytes (got {})",
                self.nonce.len()
            )));
        }
        if self.tag.len() != TAG_LEN {
            return Err(SealboxError::InvalidBlobFormat(format!(
                "tag must be {TAG_LEN} bytes (got {})",
                self.tag.len()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blob(salt: Vec<u8>) -> EncryptedBlob {
        EncryptedBlob {
            salt,
            nonce: vec![1u8; NONCE_LEN],
            tag: vec![2u8; TAG_LEN],
            ciphertext: vec![3, 4, 5, 6],
        }
    }

    #[test]
    fn encode_decode_roundtrip_with_salt() {
        let blob = sample_blob(vec![9u8; SALT_LEN]);
        let decoded = EncryptedBlob::decode(&blob.encode()).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn encode_decode_roundtrip_without_salt() {
        let blob = sample_blob(Vec::new());
        let encoded = blob.encode();
        assert!(encoded.starts_with(':'), "empty salt segment expected");
        let decoded = EncryptedBlob::decode(&encoded).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        assert!(EncryptedBlob::decode("a:b:c").is_err());
        assert!(EncryptedBlob::decode("a:b:c:d:e").is_err());
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let blob = sample_blob(vec![9u8; SALT_LEN]);
        let mut encoded = blob.encode();
        encoded.insert(0, '!');
        assert!(EncryptedBlob::decode(&encoded).is_err());
    }

    #[test]
    fn decode_rejects_wrong_nonce_length() {
        let mut blob = sample_blob(Vec::new());
        blob.nonce = vec![1u8; NONCE_LEN - 1];
        assert!(EncryptedBlob::decode(&blob.encode()).is_err());
    }

    #[test]
    fn decode_rejects_wrong_salt_length() {
        let mut blob = sample_blob(Vec::new());
        blob.salt = vec![1u8; SALT_LEN + 1];
        assert!(EncryptedBlob::decode(&blob.encode()).is_err());
    }

    #[test]
    fn json_roundtrip_uses_base64_strings() {
        let blob = sample_blob(vec![9u8; SALT_LEN]);
        let json = serde_json::to_string(&blob).unwrap();
        assert!(json.contains("\"salt\""));
        let back: EncryptedBlob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, blob);
    }
}
