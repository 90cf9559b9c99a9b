//! RSA-OAEP content-key wrapping.
//!
//! A secret's content key is wrapped under each grantee's RSA public key
//! so the server only ever stores ciphertext.  OAEP uses SHA-256 for
//! both the digest and the MGF1 mask-generation function, and its
//! padding is randomized, so wrapping the same key twice yields
//! different ciphertexts.
//!
//! Keys travel in self-describing PEM form: PKCS#8 for private keys,
//! SPKI for public keys.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::keys::{ContentKey, KEY_LEN};
use crate::errors::{Result, SealboxError};

/// Smallest acceptable RSA modulus.
pub const MIN_RSA_BITS: usize = 2048;

/// A freshly generated keypair in PEM form.
///
/// The private half is only ever returned transiently, for immediate
/// password protection; it zeroizes on drop.
pub struct KeyPairPem {
    /// SPKI-encoded public key.
    pub public_pem: String,
    /// PKCS#8-encoded private key.
    pub private_pem: Zeroizing<String>,
}

/// Generate a new RSA keypair of at least 2048 bits.
pub fn generate_keypair(bits: usize) -> Result<KeyPairPem> {
    if bits < MIN_RSA_BITS {
        return Err(SealboxError::KeyGeneration(format!(
            "RSA modulus must be at least {MIN_RSA_BITS} bits (got {bits})"
        )));
    }

    let mut rng = rand::rngs::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| SealboxError::KeyGeneration(format!("RSA keygen failed: {e}")))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| SealboxError::KeyGeneration(format!("PKCS#8 encoding failed: {e}")))?;
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| SealboxError::KeyGeneration(format!("SPKI encoding failed: {e}")))?;

    Ok(KeyPairPem {
        public_pem,
        private_pem,
    })
}

/// Wrap a content key under a recipient's public key.
pub fn wrap_content_key(content_key: &ContentKey, public_key_pem: &str) -> Result<Vec<u8>> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| SealboxError::KeyGeneration(format!("invalid public key: {e}")))?;

    let mut rng = rand::rngs::OsRng;
    public_key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), content_key.as_bytes())
        .map_err(|e| SealboxError::EncryptionFailed(format!("key wrap failed: {e}")))
}

/// Unwrap a content key with the holder's plaintext private key.
///
/// Fails closed: padding inconsistencies, key mismatches and malformed
/// input all surface as the same generic `Decrypt` error.  Leaking
/// "padding invalid" separately would re-open the classic
/// padding-oracle attack.
pub fn unwrap_content_key(wrapped: &[u8], private_key_pem: &str) -> Result<ContentKey> {
    let private_key =
        RsaPrivateKey::from_pkcs8_pem(private_key_pem).map_err(|_| SealboxError::Decrypt)?;

    let unwrapped = Zeroizing::new(
        private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|_| SealboxError::Decrypt)?,
    );

    if unwrapped.len() != KEY_LEN {
        return Err(SealboxError::Decrypt);
    }

    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&unwrapped);
    Ok(ContentKey::from_bytes(bytes))
}
