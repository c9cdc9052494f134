//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::transport::{self, AppState, ListenerError};

use super::errors::LaunchError;
use super::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

type SignalReceiver = oneshot::Receiver<Result<(), ShutdownError>>;

/// Runs the daemon using the production collaborators.
///
/// Blocks until a termination signal arrives and in-flight requests have
/// drained.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap, binding or serving fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    let shutdown = SystemShutdownSignal::new();
    run_daemon_with(&SystemConfigLoader, reporter, shutdown)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<S>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: S,
) -> Result<(), LaunchError>
where
    S: ShutdownSignal + 'static,
{
    let daemon = bootstrap_with(loader, Arc::clone(&reporter))?;
    info!(
        target: PROCESS_TARGET,
        listen_address = %daemon.config().listen_address(),
        "starting daemon runtime"
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("frp-managerd-worker")
        .build()
        .map_err(|source| LaunchError::Runtime { source })?;
    let outcome = runtime.block_on(serve_until_shutdown(&daemon, reporter.as_ref(), shutdown));
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    outcome
}

async fn serve_until_shutdown<S>(
    daemon: &Daemon,
    reporter: &dyn HealthReporter,
    shutdown: S,
) -> Result<(), LaunchError>
where
    S: ShutdownSignal + 'static,
{
    let listener = transport::bind(daemon.config().listen_address()).await?;
    let address = listener
        .local_addr()
        .map_err(|source| ListenerError::LocalAddr { source })?;
    let state = AppState::new(daemon.dispatcher().clone(), daemon.config());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(transport::serve(listener, state, async move {
        if stop_rx.await.is_err() {
            debug!(target: PROCESS_TARGET, "stop handle dropped");
        }
    }));
    let signal = watch_for_shutdown(shutdown)?;
    reporter.listener_ready(address);

    tokio::select! {
        finished = &mut server => {
            finished.map_err(|source| LaunchError::ServerTask { source })??;
            reporter.shutdown_completed();
            return Ok(());
        }
        received = signal => {
            received.unwrap_or(Err(ShutdownError::WatcherLost))?;
        }
    }

    reporter.shutdown_requested();
    if stop_tx.send(()).is_err() {
        debug!(target: PROCESS_TARGET, "server already stopped");
    }
    if let Ok(drained) = tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server).await {
        drained.map_err(|source| LaunchError::ServerTask { source })??;
    } else {
        warn!(
            target: PROCESS_TARGET,
            timeout_ms = SHUTDOWN_TIMEOUT.as_millis(),
            "in-flight requests did not drain in time; aborting"
        );
        server.abort();
    }
    reporter.shutdown_completed();
    Ok(())
}

/// Waits for `shutdown` on a dedicated thread so the runtime never blocks on
/// signal delivery.
fn watch_for_shutdown<S>(shutdown: S) -> Result<SignalReceiver, LaunchError>
where
    S: ShutdownSignal + 'static,
{
    let (signal_tx, signal_rx) = oneshot::channel();
    thread::Builder::new()
        .name("frp-managerd-signals".to_owned())
        .spawn(move || {
            if signal_tx.send(shutdown.wait()).is_err() {
                debug!(target: PROCESS_TARGET, "daemon stopped before shutdown signal");
            }
        })
        .map_err(|source| LaunchError::SignalThread { source })?;
    Ok(signal_rx)
}
