//! Audit events emitted by every vault operation that touches key
//! material or content.
//!
//! The core itself never persists audit records — it hands each event
//! to a collaborator-supplied `AuditSink`.  Two sinks ship with the
//! crate: an in-memory sink for tests and embedding, and a
//! SQLite-backed sink behind the default `audit-log` feature.
//!
//! Recording is fire-and-forget: a sink failure must never fail the
//! parent operation.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    CreateSecret,
    ReadSecret,
    ShareSecret,
    UpdateSecret,
    DeleteSecret,
}

impl AuditAction {
    /// Stable string form, as stored by sinks.
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::CreateSecret => "CREATE_SECRET",
            AuditAction::ReadSecret => "READ_SECRET",
            AuditAction::ShareSecret => "SHARE_SECRET",
            AuditAction::UpdateSecret => "UPDATE_SECRET",
            AuditAction::DeleteSecret => "DELETE_SECRET",
        }
    }
}

/// A single audit event.
///
/// Carries only identifiers and a timestamp — never plaintext content
/// or key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: String,
    pub action: AuditAction,
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event stamped with the current time.
    pub fn now(user_id: &str, action: AuditAction, resource_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            action,
            resource_id: resource_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Collaborator interface for audit persistence.
pub trait AuditSink {
    /// Record an event. Fire-and-forget — implementations swallow errors.
    fn record(&self, event: AuditEvent);
}

/// In-memory sink, append-only behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(feature = "audit-log")]
pub use sqlite::SqliteAuditSink;

#[cfg(feature = "audit-log")]
mod sqlite {
    use std::path::{Path, PathBuf};

    use chrono::{DateTime, Utc};
    use rusqlite::Connection;

    use super::{AuditAction, AuditEvent, AuditSink};
    use crate::errors::{Result, SealboxError};

    /// SQLite-backed audit sink.
    pub struct SqliteAuditSink {
        conn: Connection,
    }

    impl SqliteAuditSink {
        /// Open (or create) the audit database at `<dir>/audit.db`.
        ///
        /// Returns `None` if the database can't be opened — callers
        /// should treat this as "audit logging unavailable" and
        /// continue normally.
        pub fn open(dir: &Path) -> Option<Self> {
            let db_path = dir.join("audit.db");
            let conn = Connection::open(&db_path).ok()?;

            // Owner-only permissions on the audit database.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                let _ = std::fs::set_permissions(&db_path, perms);
            }

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS audit_log (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp   TEXT NOT NULL,
                    user_id     TEXT NOT NULL,
                    action      TEXT NOT NULL,
                    resource_id TEXT NOT NULL
                );",
            )
            .ok()?;

            Some(Self { conn })
        }

        /// Query recent audit events.
        ///
        /// - `limit`: maximum number of events to return (most recent first).
        /// - `since`: if provided, only return events newer than this timestamp.
        pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEvent>> {
            let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
            let (sql, params): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match since {
                Some(ref ts) => (
                    "SELECT timestamp, user_id, action, resource_id
                     FROM audit_log
                     WHERE timestamp >= ?1
                     ORDER BY id DESC
                     LIMIT ?2",
                    vec![
                        Box::new(ts.to_rfc3339()) as Box<dyn rusqlite::types::ToSql>,
                        Box::new(limit_i64),
                    ],
                ),
                None => (
                    "SELECT timestamp, user_id, action, resource_id
                     FROM audit_log
                     ORDER BY id DESC
                     LIMIT ?1",
                    vec![Box::new(limit_i64) as Box<dyn rusqlite::types::ToSql>],
                ),
            };

            let mut stmt = self
                .conn
                .prepare(sql)
                .map_err(|e| SealboxError::Audit(format!("query prepare: {e}")))?;

            let params_refs: Vec<&dyn rusqlite::types::ToSql> =
                params.iter().map(|p| &**p).collect();

            let rows = stmt
                .query_map(params_refs.as_slice(), |row| {
                    let ts_str: String = row.get(0)?;
                    let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));
                    let action_str: String = row.get(2)?;

                    Ok(AuditEvent {
                        timestamp,
                        user_id: row.get(1)?,
                        action: parse_action(&action_str),
                        resource_id: row.get(3)?,
                    })
                })
                .map_err(|e| SealboxError::Audit(format!("query exec: {e}")))?;

            let mut events = Vec::new();
            for row in rows {
                events.push(row.map_err(|e| SealboxError::Audit(format!("row parse: {e}")))?);
            }

            Ok(events)
        }

        /// Return the path to the audit database (for testing/display).
        pub fn db_path(dir: &Path) -> PathBuf {
            dir.join("audit.db")
        }
    }

    impl AuditSink for SqliteAuditSink {
        fn record(&self, event: AuditEvent) {
            let _ = self.conn.execute(
                "INSERT INTO audit_log (timestamp, user_id, action, resource_id)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    event.timestamp.to_rfc3339(),
                    event.user_id,
                    event.action.as_str(),
                    event.resource_id
                ],
            );
        }
    }

    fn parse_action(s: &str) -> AuditAction {
        match s {
            "READ_SECRET" => AuditAction::ReadSecret,
            "SHARE_SECRET" => AuditAction::ShareSecret,
            "UPDATE_SECRET" => AuditAction::UpdateSecret,
            "DELETE_SECRET" => AuditAction::DeleteSecret,
            _ => AuditAction::CreateSecret,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn open_creates_database() {
            let dir = TempDir::new().unwrap();
            let sink = SqliteAuditSink::open(dir.path());
            assert!(sink.is_some(), "should open successfully");
            assert!(dir.path().join("audit.db").exists());
        }

        #[test]
        fn record_and_query_roundtrip() {
            let dir = TempDir::new().unwrap();
            let sink = SqliteAuditSink::open(dir.path()).unwrap();

            sink.record(AuditEvent::now("alice", AuditAction::CreateSecret, "s-1"));
            sink.record(AuditEvent::now("alice", AuditAction::ReadSecret, "s-1"));
            sink.record(AuditEvent::now("bob", AuditAction::ShareSecret, "s-1"));

            let events = sink.query(10, None).unwrap();
            assert_eq!(events.len(), 3);

            // Most recent first.
            assert_eq!(events[0].action, AuditAction::ShareSecret);
            assert_eq!(events[0].user_id, "bob");
            assert_eq!(events[2].action, AuditAction::CreateSecret);
        }

        #[test]
        fn query_with_limit() {
            let dir = TempDir::new().unwrap();
            let sink = SqliteAuditSink::open(dir.path()).unwrap();

            for i in 0..10 {
                sink.record(AuditEvent::now(
                    "alice",
                    AuditAction::ReadSecret,
                    &format!("s-{i}"),
                ));
            }

            let events = sink.query(3, None).unwrap();
            assert_eq!(events.len(), 3);
        }

        #[test]
        fn query_with_since_filter() {
            let dir = TempDir::new().unwrap();
            let sink = SqliteAuditSink::open(dir.path()).unwrap();

            sink.record(AuditEvent::now("alice", AuditAction::CreateSecret, "s-1"));

            let past = Utc::now() - chrono::Duration::hours(1);
            let events = sink.query(10, Some(past)).unwrap();
            assert_eq!(events.len(), 1);

            let future = Utc::now() + chrono::Duration::hours(1);
            let events = sink.query(10, Some(future)).unwrap();
            assert_eq!(events.len(), 0);
        }

        #[test]
        fn open_returns_none_on_bad_path() {
            let result = SqliteAuditSink::open(Path::new("/nonexistent/path/that/does/not/exist"));
            assert!(result.is_none());
        }

        #[cfg(unix)]
        #[test]
        fn audit_db_has_restrictive_permissions() {
            use std::os::unix::fs::PermissionsExt;

            let dir = TempDir::new().unwrap();
            let _sink = SqliteAuditSink::open(dir.path()).unwrap();

            let db_path = dir.path().join("audit.db");
            let perms = std::fs::metadata(&db_path).unwrap().permissions();
            assert_eq!(
                perms.mode() & 0o777,
                0o600,
                "audit.db should have 0o600 permissions"
            );
        }
    }
}
