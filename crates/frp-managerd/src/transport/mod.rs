//! HTTP transport for the plugin endpoints.
//!
//! The frp server is configured with one `[[httpPlugins]]` entry per
//! endpoint (`/user-manager`, `/port-manager`). Requests are dispatched on
//! the blocking pool because audit appends perform synchronous IO.

mod errors;
mod handlers;
mod server;

pub use self::errors::ListenerError;
pub use self::handlers::{AppState, router};
pub use self::server::{bind, serve};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
