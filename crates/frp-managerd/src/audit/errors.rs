//! Error types for audit log storage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`AuditSink`](super::AuditSink) implementations.
///
/// Any of these aborts the request that triggered the append: the daemon
/// never acknowledges an operation whose audit entry was not stored.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The storage directory could not be created.
    #[error("failed to create audit directory '{path}': {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// An audit file could not be opened.
    #[error("failed to open audit log '{path}': {source}")]
    Open {
        /// File that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Appending or syncing an entry failed.
    #[error("failed to write audit log '{path}': {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Reading stored entries failed.
    #[error("failed to read audit log '{path}': {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// An entry could not be converted to or from JSON.
    #[error("failed to serialise audit entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored line is not a valid audit entry.
    #[error("corrupt audit entry at {path}:{line}: {source}")]
    Corrupt {
        /// File holding the corrupt line.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Parser diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// The capture time could not be rendered as RFC 3339.
    #[error("failed to format audit timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    /// The SQLite store rejected an operation.
    #[error("audit database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A previous writer panicked while holding the sink lock.
    #[error("audit sink lock poisoned")]
    Poisoned,
}
