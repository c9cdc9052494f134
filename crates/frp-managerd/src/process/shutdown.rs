//! Termination signal handling.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that stop the daemon.
const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Source of the "stop now" notification.
///
/// `wait` blocks the calling thread, so the daemon runs it on a dedicated
/// thread rather than inside the async runtime.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the daemon should stop accepting requests.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failures while waiting for shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The watcher thread went away before a signal arrived.
    #[error("shutdown watcher exited unexpectedly")]
    WatcherLost,
}

/// Waits for SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Creates the listener. Handlers are installed lazily by `wait`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "termination signal received");
        }
        Ok(())
    }
}
