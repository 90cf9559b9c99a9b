use thiserror::Error;

/// All errors that can occur in Sealbox.
///
/// The security-boundary variants (`Authentication`, `Decrypt`) are
/// deliberately cause-free: callers must not be able to tell a wrong
/// password from a corrupted blob, or a padding failure from a key
/// mismatch.
#[derive(Debug, Error)]
pub enum SealboxError {
    // --- Security-boundary errors (no cause detail) ---
    #[error("Authentication failed — wrong password or corrupted key bundle")]
    Authentication,

    #[error("Access denied")]
    AccessDenied,

    #[error("User already holds a grant for this secret")]
    DuplicateGrant,

    #[error("Decryption failed — wrong key or corrupted data")]
    Decrypt,

    #[error("{0} not found")]
    NotFound(String),

    // --- Crypto setup errors (programmer/config errors) ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid blob format: {0}")]
    InvalidBlobFormat(String),

    // --- Collaborator errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config file error: {0}")]
    Config(String),

    #[error("Audit error: {0}")]
    Audit(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for Sealbox results.
pub type Result<T> = std::result::Result<T, SealboxError>;
