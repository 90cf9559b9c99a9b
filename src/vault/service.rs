//! Protocol orchestration for the vault core.
//!
//! `SecretVaultService` owns the protocol-level invariants:
//!
//! - a secret's content key is minted exactly once, at creation, and
//!   reused across all versions and all grants;
//! - every grant of a secret wraps that identical content key;
//! - reads and shares of a deleted secret are denied;
//! - an audit event is emitted only when the operation it describes
//!   actually happened.
//!
//! The service is stateless shared behavior — it holds only immutable
//! configuration and is safe to share across concurrent callers.
//! Persistence (`VaultStore`) and audit (`AuditSink`) are collaborators
//! passed in per call; the core never issues SQL or HTTP itself.

use chrono::Utc;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::blob::EncryptedBlob;
use crate::config::CoreConfig;
use crate::crypto::keys::ContentKey;
use crate::crypto::{cipher, wrap};
use crate::errors::{Result, SealboxError};
use crate::identity::{self, Identity};

use super::store::VaultStore;
use super::types::{AccessGrant, Secret, SecretContentVersion};

/// The vault core's service facade.
#[derive(Debug, Clone, Default)]
pub struct SecretVaultService {
    config: CoreConfig,
}

impl SecretVaultService {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Pure protocol steps (no persistence)
    // ------------------------------------------------------------------

    /// Encrypt fresh secret content for an owner.
    ///
    /// Mints a random 256-bit content key, seals the content under it,
    /// and wraps the key under the owner's public key.  The plaintext
    /// content key lives only inside this call.
    pub fn protect_secret(
        &self,
        content: &[u8],
        owner_public_key: &str,
    ) -> Result<(EncryptedBlob, Vec<u8>)> {
        let content_key = ContentKey::generate();
        let sealed = cipher::seal(content_key.as_bytes(), content)?;
        let wrapped = wrap::wrap_content_key(&content_key, owner_public_key)?;
        Ok((EncryptedBlob::from_sealed(sealed), wrapped))
    }

    /// Unlock a caller's private key and read one content payload.
    pub fn unlock_and_read(
        &self,
        private_key_bundle: &str,
        password: &str,
        payload: &EncryptedBlob,
        wrapped_content_key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let private_pem =
            identity::unlock_private_key(private_key_bundle, password, &self.config.kdf_params())?;
        let content_key = wrap::unwrap_content_key(wrapped_content_key, &private_pem)?;
        cipher::open(
            content_key.as_bytes(),
            &payload.nonce,
            &payload.ciphertext,
            &payload.tag,
        )
    }

    /// Re-wrap a sharer's content key for a recipient.
    ///
    /// The hybrid step of the sharing protocol: unwrap with the
    /// sharer's private key, wrap the *same* key under the recipient's
    /// public key.  Neither the content key nor any plaintext leaves
    /// this call.
    pub fn reshare_grant(
        &self,
        sharer_bundle: &str,
        sharer_password: &str,
        sharer_wrapped_key: &[u8],
        recipient_public_key: &str,
    ) -> Result<Vec<u8>> {
        let private_pem =
            identity::unlock_private_key(sharer_bundle, sharer_password, &self.config.kdf_params())?;
        let content_key = wrap::unwrap_content_key(sharer_wrapped_key, &private_pem)?;
        wrap::wrap_content_key(&content_key, recipient_public_key)
    }

    // ------------------------------------------------------------------
    // Store-backed protocols
    // ------------------------------------------------------------------

    /// Register a user: mint an identity and persist it.
    pub fn create_identity<S: VaultStore>(
        &self,
        store: &mut S,
        user_id: &str,
        password: &str,
    ) -> Result<Identity> {
        let identity = identity::generate_identity(user_id, password, &self.config)?;
        store.insert_identity(identity.clone())?;
        Ok(identity)
    }

    /// Create a secret owned by `owner_id`.
    ///
    /// Secret, version 1, and the owner's grant are handed to the store
    /// in a single atomic call; the audit event follows only once all
    /// three are persisted.
    pub fn create_secret<S, A>(
        &self,
        store: &mut S,
        audit: &A,
        owner_id: &str,
        name: &str,
        description: Option<&str>,
        content: &[u8],
    ) -> Result<Secret>
    where
        S: VaultStore,
        A: AuditSink + ?Sized,
    {
        let owner = store.identity(owner_id)?;
        let (payload, wrapped) = self.protect_secret(content, &owner.public_key)?;

        let secret = Secret {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            owner_id: owner_id.to_string(),
            deleted: false,
            created_at: Utc::now(),
        };
        let version = SecretContentVersion {
            id: Uuid::new_v4().to_string(),
            secret_id: secret.id.clone(),
            version_number: 1,
            payload,
            created_at: Utc::now(),
        };
        let grant = AccessGrant {
            secret_id: secret.id.clone(),
            user_id: owner_id.to_string(),
            wrapped_content_key: wrapped,
            granted_at: Utc::now(),
        };

        store.create_secret(secret.clone(), version, grant)?;
        audit.record(AuditEvent::now(owner_id, AuditAction::CreateSecret, &secret.id));

        Ok(secret)
    }

    /// Read the latest content of a secret as `user_id`.
    ///
    /// The audit event is emitted only on success — a failed unlock or
    /// unwrap must not leave a trail implying content was read.
    pub fn read_secret<S, A>(
        &self,
        store: &S,
        audit: &A,
        user_id: &str,
        password: &str,
        secret_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>>
    where
        S: VaultStore,
        A: AuditSink + ?Sized,
    {
        let secret = store.secret(secret_id)?;
        if secret.deleted {
            return Err(SealboxError::AccessDenied);
        }
        let grant = store
            .grant(secret_id, user_id)?
            .ok_or(SealboxError::AccessDenied)?;

        let caller = store.identity(user_id)?;
        let version = store.latest_version(secret_id)?;

        let plaintext = self.unlock_and_read(
            &caller.private_key_bundle,
            password,
            &version.payload,
            &grant.wrapped_content_key,
        )?;

        audit.record(AuditEvent::now(user_id, AuditAction::ReadSecret, secret_id));
        Ok(plaintext)
    }

    /// Share a secret with another user.
    ///
    /// Any current grantee may share.  The recipient gets a new grant
    /// wrapping the same content key; the content itself is never
    /// re-encrypted and never decrypted here.
    pub fn share_secret<S, A>(
        &self,
        store: &mut S,
        audit: &A,
        secret_id: &str,
        sharer_id: &str,
        sharer_password: &str,
        recipient_id: &str,
    ) -> Result<AccessGrant>
    where
        S: VaultStore,
        A: AuditSink + ?Sized,
    {
        let secret = store.secret(secret_id)?;
        if secret.deleted {
            return Err(SealboxError::AccessDenied);
        }

        let recipient = store.identity(recipient_id)?;
        if store.grant(secret_id, recipient_id)?.is_some() {
            return Err(SealboxError::DuplicateGrant);
        }

        let sharer_grant = store
            .grant(secret_id, sharer_id)?
            .ok_or(SealboxError::AccessDenied)?;
        let sharer = store.identity(sharer_id)?;

        let wrapped = self.reshare_grant(
            &sharer.private_key_bundle,
            sharer_password,
            &sharer_grant.wrapped_content_key,
            &recipient.public_key,
        )?;

        let grant = AccessGrant {
            secret_id: secret_id.to_string(),
            user_id: recipient_id.to_string(),
            wrapped_content_key: wrapped,
            granted_at: Utc::now(),
        };

        // The store enforces (secret, user) uniqueness, so a racing
        // share loses with DuplicateGrant rather than corrupting state.
        store.insert_grant(grant.clone())?;
        audit.record(AuditEvent::now(sharer_id, AuditAction::ShareSecret, secret_id));

        Ok(grant)
    }

    /// Rename a secret or change its description (owner only).
    ///
    /// Metadata updates never rotate the content key.
    pub fn update_secret_metadata<S, A>(
        &self,
        store: &mut S,
        audit: &A,
        secret_id: &str,
        caller_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Secret>
    where
        S: VaultStore,
        A: AuditSink + ?Sized,
    {
        let mut secret = store.secret(secret_id)?;
        if secret.deleted || secret.owner_id != caller_id {
            return Err(SealboxError::AccessDenied);
        }

        secret.name = name.to_string();
        secret.description = description.map(str::to_string);
        store.update_secret(secret.clone())?;

        audit.record(AuditEvent::now(caller_id, AuditAction::UpdateSecret, secret_id));
        Ok(secret)
    }

    /// Append a new content version, sealed under the secret's original
    /// content key.
    ///
    /// Any grantee with a valid password may update.  The content key
    /// is recovered through the caller's own grant, so no other user's
    /// credentials are involved and existing grants keep working.
    pub fn update_secret_content<S, A>(
        &self,
        store: &mut S,
        audit: &A,
        secret_id: &str,
        user_id: &str,
        password: &str,
        content: &[u8],
    ) -> Result<SecretContentVersion>
    where
        S: VaultStore,
        A: AuditSink + ?Sized,
    {
        let secret = store.secret(secret_id)?;
        if secret.deleted {
            return Err(SealboxError::AccessDenied);
        }
        let grant = store
            .grant(secret_id, user_id)?
            .ok_or(SealboxError::AccessDenied)?;
        let caller = store.identity(user_id)?;
        let latest = store.latest_version(secret_id)?;

        let private_pem =
            identity::unlock_private_key(&caller.private_key_bundle, password, &self.config.kdf_params())?;
        let content_key = wrap::unwrap_content_key(&grant.wrapped_content_key, &private_pem)?;
        let sealed = cipher::seal(content_key.as_bytes(), content)?;

        let version = SecretContentVersion {
            id: Uuid::new_v4().to_string(),
            secret_id: secret_id.to_string(),
            version_number: latest.version_number + 1,
            payload: EncryptedBlob::from_sealed(sealed),
            created_at: Utc::now(),
        };

        store.insert_version(version.clone())?;
        audit.record(AuditEvent::now(user_id, AuditAction::UpdateSecret, secret_id));

        Ok(version)
    }

    /// Soft-delete a secret (owner only).
    ///
    /// Sets the visibility flag; ciphertext and grants stay in place.
    /// This is not crypto-shredding.
    pub fn delete_secret<S, A>(
        &self,
        store: &mut S,
        audit: &A,
        secret_id: &str,
        caller_id: &str,
    ) -> Result<()>
    where
        S: VaultStore,
        A: AuditSink + ?Sized,
    {
        let mut secret = store.secret(secret_id)?;
        if secret.owner_id != caller_id {
            return Err(SealboxError::AccessDenied);
        }

        secret.deleted = true;
        store.update_secret(secret)?;

        audit.record(AuditEvent::now(caller_id, AuditAction::DeleteSecret, secret_id));
        Ok(())
    }

    /// All non-deleted secrets the user holds a grant for.
    pub fn list_secrets<S: VaultStore>(&self, store: &S, user_id: &str) -> Result<Vec<Secret>> {
        store.secrets_for_user(user_id)
    }
}
