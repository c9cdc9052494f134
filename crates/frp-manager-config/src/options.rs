//! Closed option sets accepted on the command line, in the environment and in
//! the configuration file.
//!
//! Both enums parse case-insensitively and render in `snake_case`, so the
//! value a user typed round-trips through `--help` output and log lines.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output encoding for daemon telemetry.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Terse single-line text for terminals.
    Compact,
}

/// Parse failure for [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

/// Storage backing the operation audit log.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AuditBackend {
    /// One append-only JSON-lines file per operation kind.
    #[default]
    File,
    /// A single SQLite database; each append runs in its own transaction.
    Sqlite,
    /// Process-local memory. Entries are lost on restart.
    Memory,
}

/// Parse failure for [`AuditBackend`].
pub type AuditBackendParseError = strum::ParseError;
