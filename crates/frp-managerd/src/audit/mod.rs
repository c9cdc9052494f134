//! Append-only audit log for validated plugin operations.
//!
//! The dispatcher records every successfully validated operation through the
//! [`AuditSink`] trait before it answers the frp server. Three
//! implementations ship with the daemon and are selected by
//! [`AuditBackend`]:
//!
//! * [`JsonLinesAuditSink`] appends one JSON object per line to a file per
//!   operation kind (`<dir>/login.jsonl`, `<dir>/ping.jsonl`, ...).
//! * [`SqliteAuditSink`] inserts each entry in its own transaction.
//! * [`MemoryAuditSink`] keeps entries in process memory.
//!
//! Every implementation serialises appends internally, so entries of one
//! kind are read back in the order their appends completed.

mod entry;
mod errors;
mod file;
mod memory;
mod sqlite;

use std::sync::Arc;

use frp_manager_config::{AuditBackend, Config};
use tracing::info;

pub use self::entry::AuditEntry;
pub use self::errors::AuditError;
pub use self::file::JsonLinesAuditSink;
pub use self::memory::MemoryAuditSink;
pub use self::sqlite::SqliteAuditSink;

use crate::dispatch::OperationKind;

/// Tracing target for audit storage.
pub(crate) const AUDIT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::audit");

/// Storage for audit entries, keyed by operation kind.
///
/// Implementations must make `append` atomic with respect to concurrent
/// callers: a subsequent [`entries`](Self::entries) call observes either the
/// whole entry or nothing, and never a duplicate.
#[cfg_attr(test, mockall::automock)]
pub trait AuditSink: Send + Sync {
    /// Durably records `entry` under `kind`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuditError`] when the entry could not be stored. The
    /// caller must then treat the request as failed.
    fn append(&self, kind: OperationKind, entry: &AuditEntry) -> Result<(), AuditError>;

    /// Returns every entry recorded under `kind`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an [`AuditError`] when the backing store cannot be read.
    fn entries(&self, kind: OperationKind) -> Result<Vec<AuditEntry>, AuditError>;
}

/// Opens the sink selected by the configuration.
///
/// # Errors
///
/// Returns an [`AuditError`] when the backing directory or database cannot be
/// prepared.
pub fn open_sink(config: &Config) -> Result<Arc<dyn AuditSink>, AuditError> {
    let sink: Arc<dyn AuditSink> = match config.audit_backend() {
        AuditBackend::File => Arc::new(JsonLinesAuditSink::open(config.audit_dir())?),
        AuditBackend::Sqlite => Arc::new(SqliteAuditSink::open(config.audit_database())?),
        AuditBackend::Memory => Arc::new(MemoryAuditSink::new()),
    };
    info!(
        target: AUDIT_TARGET,
        backend = %config.audit_backend(),
        "audit sink ready"
    );
    Ok(sink)
}
