//! frp server-plugin manager daemon.
//!
//! The frp server forwards client lifecycle events (logins, new proxies,
//! heartbeats, work and user connections) to HTTP plugins and waits for a
//! decision. This crate implements such a plugin: every request is decoded,
//! validated against the operation's payload record, recorded in an
//! append-only audit log and answered with an accept, reject or modify
//! decision.
//!
//! The daemon is assembled in three layers:
//!
//! 1. [`dispatch`] turns a request body into a [`DecisionResponse`]. It is
//!    synchronous and knows nothing about HTTP.
//! 2. [`audit`] stores entries through the [`AuditSink`] trait, backed by
//!    JSON-lines files, SQLite or process memory.
//! 3. The transport serves `/user-manager`, `/port-manager` and the
//!    `/logs/<op>` read endpoints with axum, and [`run_daemon`] wires it to
//!    configuration, telemetry and signal-driven shutdown.
//!
//! Bootstrap emits structured health events at each stage through a
//! [`HealthReporter`] so operators can see where a start-up failed.

pub mod audit;
mod bootstrap;
pub mod dispatch;
mod health;
mod process;
mod telemetry;
mod transport;

pub use audit::{
    AuditEntry, AuditError, AuditSink, JsonLinesAuditSink, MemoryAuditSink, SqliteAuditSink,
};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{DecisionResponse, DispatchError, Dispatcher, EndpointTag, InboundRequest};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{AppState, ListenerError, router};

#[cfg(test)]
mod tests;
