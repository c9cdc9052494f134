use std::fs;
use std::sync::Mutex;

use camino::Utf8Path;
use rusqlite::{Connection, params};
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use super::{AUDIT_TARGET, AuditEntry, AuditError, AuditSink};
use crate::dispatch::OperationKind;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS audit_entries (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        channel TEXT NOT NULL,
        id TEXT NOT NULL UNIQUE,
        endpoint TEXT NOT NULL,
        req_id TEXT,
        captured_at TEXT NOT NULL,
        entry TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS audit_entries_channel ON audit_entries (channel, seq);
";

/// Transactional audit storage backed by a single SQLite database.
///
/// All operation kinds share one table; `channel` holds the kind and `seq`
/// records insertion order. The connection sits behind a mutex, so appends
/// are serialised and each commits in its own transaction.
#[derive(Debug)]
pub struct SqliteAuditSink {
    conn: Mutex<Connection>,
}

impl SqliteAuditSink {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuditError`] when the parent directory cannot be created
    /// or the schema cannot be initialised.
    pub fn open(path: &Utf8Path) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| AuditError::CreateDir {
                path: parent.as_std_path().to_path_buf(),
                source,
            })?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an [`AuditError`] when the schema cannot be initialised.
    pub fn in_memory() -> Result<Self, AuditError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl AuditSink for SqliteAuditSink {
    fn append(&self, kind: OperationKind, entry: &AuditEntry) -> Result<(), AuditError> {
        let captured_at = entry.timestamp.format(&Rfc3339)?;
        let serialised = serde_json::to_string(entry)?;

        let mut conn = self.conn.lock().map_err(|_| AuditError::Poisoned)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO audit_entries (channel, id, endpoint, req_id, captured_at, entry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                kind.descriptor().audit_channel,
                entry.id.to_string(),
                &entry.endpoint,
                &entry.req_id,
                captured_at,
                serialised,
            ],
        )?;
        tx.commit()?;

        debug!(target: AUDIT_TARGET, channel = kind.descriptor().audit_channel, id = %entry.id, "audit entry committed");
        Ok(())
    }

    fn entries(&self, kind: OperationKind) -> Result<Vec<AuditEntry>, AuditError> {
        let conn = self.conn.lock().map_err(|_| AuditError::Poisoned)?;
        let mut stmt =
            conn.prepare("SELECT entry FROM audit_entries WHERE channel = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![kind.descriptor().audit_channel], |row| {
            row.get::<_, String>(0)
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(serde_json::from_str(&row?)?);
        }
        Ok(entries)
    }
}
