//! The persistence boundary of the vault core.
//!
//! `VaultStore` is the collaborator interface the surrounding
//! application implements over its database.  The core calls it with
//! fully built records and relies on two storage-level contracts:
//!
//! - `create_secret` persists secret + version + grant atomically
//!   (all three succeed or none do).
//! - `insert_grant` enforces uniqueness per (secret, user) and reports
//!   a conflict as `DuplicateGrant` — this is what resolves two racing
//!   share operations without corrupted state.
//!
//! `MemoryVaultStore` implements the trait for tests and embedding.

use std::collections::HashMap;

use crate::errors::{Result, SealboxError};
use crate::identity::Identity;

use super::types::{AccessGrant, Secret, SecretContentVersion};

/// Collaborator interface for persistence.
pub trait VaultStore {
    /// Persist a new identity. Rejects a duplicate user id.
    fn insert_identity(&mut self, identity: Identity) -> Result<()>;

    /// Look up a user's identity. `NotFound` if unknown.
    fn identity(&self, user_id: &str) -> Result<Identity>;

    /// Look up a secret record. `NotFound` if unknown.
    fn secret(&self, secret_id: &str) -> Result<Secret>;

    /// The highest-numbered content version of a secret.
    fn latest_version(&self, secret_id: &str) -> Result<SecretContentVersion>;

    /// The grant held by `user_id` on `secret_id`, if any.
    fn grant(&self, secret_id: &str, user_id: &str) -> Result<Option<AccessGrant>>;

    /// Atomically persist a new secret, its first content version, and
    /// the owner's grant.
    fn create_secret(
        &mut self,
        secret: Secret,
        version: SecretContentVersion,
        grant: AccessGrant,
    ) -> Result<()>;

    /// Append a content version to an existing secret.
    fn insert_version(&mut self, version: SecretContentVersion) -> Result<()>;

    /// Persist a grant. `DuplicateGrant` if the (secret, user) pair
    /// already holds one.
    fn insert_grant(&mut self, grant: AccessGrant) -> Result<()>;

    /// Overwrite a secret's mutable fields (name, description, deleted).
    fn update_secret(&mut self, secret: Secret) -> Result<()>;

    /// All non-deleted secrets the user holds a grant for.
    fn secrets_for_user(&self, user_id: &str) -> Result<Vec<Secret>>;
}

/// In-memory store used by the test suite and embedders without a
/// database.  Enforces the same uniqueness and atomicity contracts a
/// relational backend would.
#[derive(Debug, Default)]
pub struct MemoryVaultStore {
    identities: HashMap<String, Identity>,
    secrets: HashMap<String, Secret>,
    versions: Vec<SecretContentVersion>,
    grants: Vec<AccessGrant>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn has_grant(&self, secret_id: &str, user_id: &str) -> bool {
        self.grants
            .iter()
            .any(|g| g.secret_id == secret_id && g.user_id == user_id)
    }
}

impl VaultStore for MemoryVaultStore {
    fn insert_identity(&mut self, identity: Identity) -> Result<()> {
        if self.identities.contains_key(&identity.id) {
            return Err(SealboxError::Storage(format!(
                "identity '{}' already exists",
                identity.id
            )));
        }
        self.identities.insert(identity.id.clone(), identity);
        Ok(())
    }

    fn identity(&self, user_id: &str) -> Result<Identity> {
        self.identities
            .get(user_id)
            .cloned()
            .ok_or_else(|| SealboxError::NotFound(format!("User '{user_id}'")))
    }

    fn secret(&self, secret_id: &str) -> Result<Secret> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SealboxError::NotFound(format!("Secret '{secret_id}'")))
    }

    fn latest_version(&self, secret_id: &str) -> Result<SecretContentVersion> {
        self.versions
            .iter()
            .filter(|v| v.secret_id == secret_id)
            .max_by_key(|v| v.version_number)
            .cloned()
            .ok_or_else(|| SealboxError::NotFound(format!("Content for secret '{secret_id}'")))
    }

    fn grant(&self, secret_id: &str, user_id: &str) -> Result<Option<AccessGrant>> {
        Ok(self
            .grants
            .iter()
            .find(|g| g.secret_id == secret_id && g.user_id == user_id)
            .cloned())
    }

    fn create_secret(
        &mut self,
        secret: Secret,
        version: SecretContentVersion,
        grant: AccessGrant,
    ) -> Result<()> {
        // Validate every constraint before touching state so the insert
        // is all-or-nothing.
        if self.secrets.contains_key(&secret.id) {
            return Err(SealboxError::Storage(format!(
                "secret '{}' already exists",
                secret.id
            )));
        }
        if version.secret_id != secret.id || grant.secret_id != secret.id {
            return Err(SealboxError::Storage(
                "version and grant must reference the new secret".into(),
            ));
        }

        self.secrets.insert(secret.id.clone(), secret);
        self.versions.push(version);
        self.grants.push(grant);
        Ok(())
    }

    fn insert_version(&mut self, version: SecretContentVersion) -> Result<()> {
        if !self.secrets.contains_key(&version.secret_id) {
            return Err(SealboxError::NotFound(format!(
                "Secret '{}'",
                version.secret_id
            )));
        }
        self.versions.push(version);
        Ok(())
    }

    fn insert_grant(&mut self, grant: AccessGrant) -> Result<()> {
        if self.has_grant(&grant.secret_id, &grant.user_id) {
            return Err(SealboxError::DuplicateGrant);
        }
        self.grants.push(grant);
        Ok(())
    }

    fn update_secret(&mut self, secret: Secret) -> Result<()> {
        match self.secrets.get_mut(&secret.id) {
            Some(existing) => {
                *existing = secret;
                Ok(())
            }
            None => Err(SealboxError::NotFound(format!("Secret '{}'", secret.id))),
        }
    }

    fn secrets_for_user(&self, user_id: &str) -> Result<Vec<Secret>> {
        Ok(self
            .secrets
            .values()
            .filter(|s| !s.deleted && self.has_grant(&s.id, user_id))
            .cloned()
            .collect())
    }
}
