//! Shared configuration for the frp plugin manager daemon.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults are
//! overridden by a TOML file (`--config-path`), then by `FRP_MANAGER_*`
//! environment variables, and finally by command-line flags such as
//! `--listen-address` or `--audit-backend`.

mod defaults;
mod options;

use std::net::SocketAddr;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_AUDIT_DATABASE, DEFAULT_AUDIT_DIR, DEFAULT_LISTEN_ADDRESS, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_MS, default_audit_backend,
    default_audit_database, default_audit_dir, default_listen_address, default_log_filter,
    default_log_filter_string, default_log_format, default_max_body_bytes,
    default_request_timeout_ms,
};
pub use options::{AuditBackend, AuditBackendParseError, LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FRP_MANAGER")]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[serde(default = "defaults::default_listen_address")]
    pub listen_address: SocketAddr,
    /// `tracing` filter expression applied to daemon telemetry.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Storage used for the operation audit log.
    #[serde(default = "defaults::default_audit_backend")]
    pub audit_backend: AuditBackend,
    /// Directory holding one JSON-lines file per operation kind.
    #[serde(default = "defaults::default_audit_dir")]
    pub audit_dir: Utf8PathBuf,
    /// SQLite database file used by the `sqlite` backend.
    #[serde(default = "defaults::default_audit_database")]
    pub audit_database: Utf8PathBuf,
    /// Budget for handling one plugin request, in milliseconds.
    #[serde(default = "defaults::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Largest accepted request body, in bytes.
    #[serde(default = "defaults::default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            audit_backend: default_audit_backend(),
            audit_dir: default_audit_dir(),
            audit_database: default_audit_database(),
            request_timeout_ms: default_request_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Config {
    /// Address the HTTP listener binds to.
    #[must_use]
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Filter expression handed to the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Telemetry output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Selected audit log backend.
    #[must_use]
    pub fn audit_backend(&self) -> AuditBackend {
        self.audit_backend
    }

    /// Directory used by the file backend.
    #[must_use]
    pub fn audit_dir(&self) -> &Utf8Path {
        self.audit_dir.as_path()
    }

    /// Database path used by the SQLite backend.
    #[must_use]
    pub fn audit_database(&self) -> &Utf8Path {
        self.audit_database.as_path()
    }

    /// Per-request time budget.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Largest accepted request body, in bytes.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_file_backend() {
        let config = Config::default();
        assert_eq!(config.audit_backend(), AuditBackend::File);
        assert_eq!(config.audit_dir(), Utf8Path::new(DEFAULT_AUDIT_DIR));
        assert_eq!(config.listen_address().port(), 7200);
    }

    #[test]
    fn request_timeout_converts_milliseconds() {
        let config = Config {
            request_timeout_ms: 250,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
    }
}
