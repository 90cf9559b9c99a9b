//! End-to-end tests for the secret vault protocols: create, read,
//! share, update, delete — against the in-memory store and audit sink.

use sealbox::audit::{AuditAction, MemoryAuditSink};
use sealbox::config::CoreConfig;
use sealbox::crypto::unwrap_content_key;
use sealbox::errors::SealboxError;
use sealbox::identity::unlock_private_key;
use sealbox::vault::{MemoryVaultStore, SecretVaultService, VaultStore};

fn test_config() -> CoreConfig {
    CoreConfig {
        kdf_memory_kib: 8_192,
        kdf_iterations: 1,
        kdf_parallelism: 1,
        rsa_bits: 2048,
    }
}

struct Fixture {
    service: SecretVaultService,
    store: MemoryVaultStore,
    audit: MemoryAuditSink,
}

/// A service with two registered users, "alice" (password "alice-pw")
/// and "bob" (password "bob-pw").
fn setup() -> Fixture {
    let service = SecretVaultService::new(test_config());
    let mut store = MemoryVaultStore::new();

    service
        .create_identity(&mut store, "alice", "alice-pw")
        .expect("register alice");
    service
        .create_identity(&mut store, "bob", "bob-pw")
        .expect("register bob");

    Fixture {
        service,
        store,
        audit: MemoryAuditSink::new(),
    }
}

#[test]
fn create_read_share_scenario() {
    let mut fx = setup();

    // Alice creates a secret.
    let secret = fx
        .service
        .create_secret(
            &mut fx.store,
            &fx.audit,
            "alice",
            "db-creds",
            Some("production database"),
            b"pass123",
        )
        .expect("create");
    assert_eq!(secret.owner_id, "alice");

    // Alice reads it back with her own password.
    let plaintext = fx
        .service
        .read_secret(&fx.store, &fx.audit, "alice", "alice-pw", &secret.id)
        .expect("alice read");
    assert_eq!(&*plaintext, b"pass123");

    // Alice shares with Bob.
    fx.service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob")
        .expect("share");

    // Bob reads the identical plaintext with *his* password — Alice's
    // password is never involved in Bob's read.
    let plaintext = fx
        .service
        .read_secret(&fx.store, &fx.audit, "bob", "bob-pw", &secret.id)
        .expect("bob read");
    assert_eq!(&*plaintext, b"pass123");

    // Re-sharing with Bob is rejected.
    let err = fx
        .service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob")
        .unwrap_err();
    assert!(matches!(err, SealboxError::DuplicateGrant));

    // The audit trail matches what actually happened.
    let actions: Vec<AuditAction> = fx.audit.events().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::CreateSecret,
            AuditAction::ReadSecret,
            AuditAction::ShareSecret,
            AuditAction::ReadSecret,
        ]
    );
}

#[test]
fn all_grants_wrap_the_identical_content_key() {
    let mut fx = setup();
    let params = test_config().kdf_params();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "api-key", None, b"s3cret")
        .expect("create");
    fx.service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob")
        .expect("share");

    let alice = fx.service.list_secrets(&fx.store, "alice").expect("list");
    assert_eq!(alice.len(), 1);

    // Unwrap each grant under its holder's own private key.
    let unwrap_for = |store: &MemoryVaultStore, user: &str, password: &str| {
        let identity = store.identity(user).unwrap();
        let grant = store.grant(&secret.id, user).unwrap().unwrap();
        let pem = unlock_private_key(&identity.private_key_bundle, password, &params).unwrap();
        unwrap_content_key(&grant.wrapped_content_key, &pem).unwrap()
    };

    let key_a = unwrap_for(&fx.store, "alice", "alice-pw");
    let key_b = unwrap_for(&fx.store, "bob", "bob-pw");
    assert_eq!(key_a.as_bytes(), key_b.as_bytes());
}

#[test]
fn reading_twice_is_idempotent() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "token", None, b"abc123")
        .expect("create");

    let first = fx
        .service
        .read_secret(&fx.store, &fx.audit, "alice", "alice-pw", &secret.id)
        .expect("read 1");
    let second = fx
        .service
        .read_secret(&fx.store, &fx.audit, "alice", "alice-pw", &secret.id)
        .expect("read 2");

    assert_eq!(&*first, &*second);
}

#[test]
fn read_is_denied_without_a_grant() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "private", None, b"x")
        .expect("create");

    let err = fx
        .service
        .read_secret(&fx.store, &fx.audit, "bob", "bob-pw", &secret.id)
        .unwrap_err();
    assert!(matches!(err, SealboxError::AccessDenied));
}

#[test]
fn unknown_secret_is_not_found() {
    let fx = setup();

    let err = fx
        .service
        .read_secret(&fx.store, &fx.audit, "alice", "alice-pw", "no-such-id")
        .unwrap_err();
    assert!(matches!(err, SealboxError::NotFound(_)));
}

#[test]
fn wrong_password_fails_closed_and_leaves_no_read_event() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "token", None, b"x")
        .expect("create");
    let events_before = fx.audit.events().len();

    let err = fx
        .service
        .read_secret(&fx.store, &fx.audit, "alice", "wrong-pw", &secret.id)
        .unwrap_err();
    assert!(matches!(err, SealboxError::Authentication));

    // No READ_SECRET event for a read that never produced plaintext.
    assert_eq!(fx.audit.events().len(), events_before);
}

#[test]
fn sharing_requires_the_sharer_to_hold_a_grant() {
    let mut fx = setup();
    fx.service
        .create_identity(&mut fx.store, "carol", "carol-pw")
        .expect("register carol");

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "token", None, b"x")
        .expect("create");

    // Bob holds no grant, so he cannot share with Carol.
    let err = fx
        .service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "bob", "bob-pw", "carol")
        .unwrap_err();
    assert!(matches!(err, SealboxError::AccessDenied));
}

#[test]
fn sharing_with_an_unknown_user_is_not_found() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "token", None, b"x")
        .expect("create");

    let err = fx
        .service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "mallory")
        .unwrap_err();
    assert!(matches!(err, SealboxError::NotFound(_)));
}

#[test]
fn content_updates_reuse_the_original_content_key() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "db-creds", None, b"v1-password")
        .expect("create");
    fx.service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob")
        .expect("share");

    // Bob (a grantee, not the owner) appends a new version.
    let version = fx
        .service
        .update_secret_content(
            &mut fx.store,
            &fx.audit,
            &secret.id,
            "bob",
            "bob-pw",
            b"v2-password",
        )
        .expect("update");
    assert_eq!(version.version_number, 2);

    // Both users read the new content through their existing grants —
    // no re-wrap was needed because the content key never changed.
    let alice = fx
        .service
        .read_secret(&fx.store, &fx.audit, "alice", "alice-pw", &secret.id)
        .expect("alice read");
    let bob = fx
        .service
        .read_secret(&fx.store, &fx.audit, "bob", "bob-pw", &secret.id)
        .expect("bob read");
    assert_eq!(&*alice, b"v2-password");
    assert_eq!(&*bob, b"v2-password");
}

#[test]
fn metadata_updates_are_owner_only_and_keep_content_readable() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "old-name", None, b"payload")
        .expect("create");
    fx.service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob")
        .expect("share");

    // A grantee who is not the owner cannot rename.
    let err = fx
        .service
        .update_secret_metadata(&mut fx.store, &fx.audit, &secret.id, "bob", "hijacked", None)
        .unwrap_err();
    assert!(matches!(err, SealboxError::AccessDenied));

    let updated = fx
        .service
        .update_secret_metadata(
            &mut fx.store,
            &fx.audit,
            &secret.id,
            "alice",
            "new-name",
            Some("rotated description"),
        )
        .expect("rename");
    assert_eq!(updated.name, "new-name");

    // Renaming rotated nothing: the content still opens.
    let plaintext = fx
        .service
        .read_secret(&fx.store, &fx.audit, "bob", "bob-pw", &secret.id)
        .expect("read");
    assert_eq!(&*plaintext, b"payload");
}

#[test]
fn soft_delete_hides_the_secret_without_erasing_it() {
    let mut fx = setup();

    let secret = fx
        .service
        .create_secret(&mut fx.store, &fx.audit, "alice", "doomed", None, b"x")
        .expect("create");
    fx.service
        .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob")
        .expect("share");

    // Only the owner may delete.
    let err = fx
        .service
        .delete_secret(&mut fx.store, &fx.audit, &secret.id, "bob")
        .unwrap_err();
    assert!(matches!(err, SealboxError::AccessDenied));

    fx.service
        .delete_secret(&mut fx.store, &fx.audit, &secret.id, "alice")
        .expect("delete");

    // Reads and shares are denied; the record itself is still present.
    assert!(matches!(
        fx.service
            .read_secret(&fx.store, &fx.audit, "alice", "alice-pw", &secret.id),
        Err(SealboxError::AccessDenied)
    ));
    assert!(matches!(
        fx.service
            .share_secret(&mut fx.store, &fx.audit, &secret.id, "alice", "alice-pw", "bob"),
        Err(SealboxError::AccessDenied)
    ));
    assert!(fx.service.list_secrets(&fx.store, "alice").unwrap().is_empty());

    let actions: Vec<AuditAction> = fx.audit.events().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::CreateSecret,
            AuditAction::ShareSecret,
            AuditAction::DeleteSecret,
        ]
    );
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut fx = setup();
    let err = fx
        .service
        .create_identity(&mut fx.store, "alice", "another-pw")
        .unwrap_err();
    assert!(matches!(err, SealboxError::Storage(_)));
}
