//! Plugin request dispatch.
//!
//! The frp server POSTs one JSON envelope per lifecycle event:
//!
//! ```json
//! {"version":"0.1.0","op":"NewProxy","content":{"proxy_name":"web1"}}
//! ```
//!
//! [`Dispatcher::dispatch`] decodes the envelope, resolves `op` through the
//! static registry, binds `content` to the operation's typed record, records
//! an audit entry and builds the decision:
//!
//! ```json
//! {"unchange":false,"content":{"proxy_name":"web1"}}
//! ```
//!
//! Unknown operations are answered with
//! `{"reject":true,"reject_reason":"Unsupported operation"}` and are never
//! recorded.

mod dispatcher;
mod envelope;
mod errors;
mod payloads;
pub mod registry;
mod response;

pub use self::dispatcher::{Dispatcher, EndpointTag, InboundRequest};
pub use self::envelope::RpcEnvelope;
pub use self::errors::{DispatchError, FailureClass};
pub use self::payloads::{
    CloseProxyContent, LoginContent, NewProxyContent, NewUserConnContent, NewWorkConnContent,
    OperationPayload, PayloadFault, PingContent, UserRef, WirePayload, decode_payload,
};
pub use self::registry::{Operation, OperationDescriptor, OperationKind};
pub use self::response::{DecisionResponse, ResponsePolicy, UNSUPPORTED_OPERATION};

/// Tracing target for request dispatch.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
