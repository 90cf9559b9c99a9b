use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{Result, SealboxError};

/// Deployment-level configuration, loaded from `sealbox.toml`.
///
/// Every field has a sensible default so the core works out-of-the-box
/// without any config file at all.  The KDF parameters are part of the
/// deployment contract: a bundle protected under one profile can only
/// be unlocked under the same profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Argon2id memory cost in KiB (default: 19 MB).
    #[serde(default = "default_kdf_memory_kib")]
    pub kdf_memory_kib: u32,

    /// Argon2id iteration count (default: 2).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism degree (default: 1).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,

    /// RSA modulus size in bits for new identities (default: 2048).
    #[serde(default = "default_rsa_bits")]
    pub rsa_bits: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kdf_memory_kib() -> u32 {
    19_456 // 19 MB
}

fn default_kdf_iterations() -> u32 {
    2
}

fn default_kdf_parallelism() -> u32 {
    1
}

fn default_rsa_bits() -> usize {
    2048
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            kdf_memory_kib: default_kdf_memory_kib(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
            rsa_bits: default_rsa_bits(),
        }
    }
}

impl CoreConfig {
    /// Name of the config file we look for in the deployment directory.
    const FILE_NAME: &'static str = "sealbox.toml";

    /// Load configuration from `<dir>/sealbox.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| SealboxError::Config(format!("{}: {e}", config_path.display())))?;

        let config: CoreConfig = toml::from_str(&contents).map_err(|e| {
            SealboxError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(config)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.kdf_memory_kib,
            iterations: self.kdf_iterations,
            parallelism: self.kdf_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CoreConfig::load(dir.path()).unwrap();
        assert_eq!(config.kdf_memory_kib, 19_456);
        assert_eq!(config.kdf_iterations, 2);
        assert_eq!(config.rsa_bits, 2048);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sealbox.toml"), "kdf_iterations = 4\n").unwrap();

        let config = CoreConfig::load(dir.path()).unwrap();
        assert_eq!(config.kdf_iterations, 4);
        assert_eq!(config.kdf_memory_kib, 19_456);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sealbox.toml"), "kdf_iterations = [oops\n").unwrap();

        assert!(CoreConfig::load(dir.path()).is_err());
    }

    #[test]
    fn kdf_params_mirror_config() {
        let config = CoreConfig {
            kdf_memory_kib: 32_768,
            kdf_iterations: 3,
            kdf_parallelism: 2,
            rsa_bits: 3072,
        };
        let params = config.kdf_params();
        assert_eq!(params.memory_kib, 32_768);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 2);
    }
}
