//! Listener binding and the serve loop.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use super::{AppState, ListenerError, TRANSPORT_TARGET, router};

/// Binds the HTTP listener.
///
/// # Errors
///
/// Returns [`ListenerError::Bind`] when the address is unavailable.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    let local = listener
        .local_addr()
        .map_err(|source| ListenerError::LocalAddr { source })?;
    info!(target: TRANSPORT_TARGET, address = %local, "listener bound");
    Ok(listener)
}

/// Serves the plugin endpoints until `shutdown` resolves.
///
/// In-flight requests are allowed to finish once shutdown begins.
///
/// # Errors
///
/// Returns [`ListenerError::Serve`] when the accept loop fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ListenerError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| ListenerError::Serve { source })?;
    info!(target: TRANSPORT_TARGET, "listener stopped");
    Ok(())
}
