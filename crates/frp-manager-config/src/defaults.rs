use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use camino::Utf8PathBuf;

use crate::options::{AuditBackend, LogFormat};

/// Default listener address. frp's `httpPlugins` usually point at loopback.
pub const DEFAULT_LISTEN_ADDRESS: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7200);

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default directory for JSON-lines audit files.
pub const DEFAULT_AUDIT_DIR: &str = "frp-audit";

/// Default SQLite database file.
pub const DEFAULT_AUDIT_DATABASE: &str = "frp.db";

/// Default per-request budget in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default listener address as a [`SocketAddr`].
#[must_use]
pub fn default_listen_address() -> SocketAddr {
    SocketAddr::V4(DEFAULT_LISTEN_ADDRESS)
}

/// Default log filter expression used by the daemon.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default audit backend.
#[must_use]
pub fn default_audit_backend() -> AuditBackend {
    AuditBackend::File
}

/// Default directory for JSON-lines audit files.
#[must_use]
pub fn default_audit_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_AUDIT_DIR)
}

/// Default SQLite database file.
#[must_use]
pub fn default_audit_database() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_AUDIT_DATABASE)
}

/// Default per-request budget in milliseconds.
#[must_use]
pub fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default request body limit.
#[must_use]
pub fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}
