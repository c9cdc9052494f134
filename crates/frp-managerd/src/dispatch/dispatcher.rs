//! Request orchestration: envelope, registry, validation, audit, response.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::DISPATCH_TARGET;
use super::envelope::RpcEnvelope;
use super::errors::DispatchError;
use super::registry::{self, Operation, OperationKind};
use super::response::DecisionResponse;
use crate::audit::{AuditEntry, AuditSink};

/// Endpoint a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointTag {
    /// `/user-manager`, typically wired to `Login`/`Ping`/`NewWorkConn`.
    UserManager,
    /// `/port-manager`, typically wired to proxy and user connection events.
    PortManager,
}

impl EndpointTag {
    /// Tag recorded in audit entries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserManager => "user-manager",
            Self::PortManager => "port-manager",
        }
    }
}

impl fmt::Display for EndpointTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One plugin request as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// Endpoint the request arrived on.
    pub endpoint: EndpointTag,
    /// Value of the `X-Frp-Reqid` header.
    pub correlation_id: Option<String>,
    /// Informational `op` query parameter.
    pub query_op: Option<String>,
    /// Informational `version` query parameter.
    pub query_version: Option<String>,
    /// Raw request body.
    pub body: Vec<u8>,
    /// Instant after which the request must not be recorded.
    pub deadline: Option<Instant>,
}

impl InboundRequest {
    /// Creates a request with no metadata and no deadline.
    pub fn new(endpoint: EndpointTag, body: impl Into<Vec<u8>>) -> Self {
        Self {
            endpoint,
            correlation_id: None,
            query_op: None,
            query_version: None,
            body: body.into(),
            deadline: None,
        }
    }

    /// Attaches the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Attaches the query parameters.
    #[must_use]
    pub fn with_query(mut self, query_op: Option<String>, query_version: Option<String>) -> Self {
        self.query_op = query_op;
        self.query_version = query_version;
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Dispatches plugin requests against one audit sink.
///
/// The dispatcher holds no per-request state and is shared between request
/// tasks through an [`Arc`].
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn AuditSink>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher recording into `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Handles one request and returns the decision for the frp server.
    ///
    /// Unknown operations are answered with a rejection and are neither
    /// validated nor recorded. Known operations are recorded before the
    /// decision is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the envelope or payload is unusable,
    /// when the deadline passed before recording, or when the sink fails.
    pub fn dispatch(&self, request: InboundRequest) -> Result<DecisionResponse, DispatchError> {
        let result = self.process(request);
        if let Err(error) = &result {
            warn!(target: DISPATCH_TARGET, %error, "plugin request failed");
        }
        result
    }

    fn process(&self, request: InboundRequest) -> Result<DecisionResponse, DispatchError> {
        let envelope = RpcEnvelope::decode(&request.body)?;
        let kind = match registry::lookup(envelope.op_name()) {
            Operation::Known(kind) => kind,
            Operation::Unknown(name) => {
                info!(
                    target: DISPATCH_TARGET,
                    endpoint = %request.endpoint,
                    op = name.as_deref().unwrap_or_default(),
                    "rejecting unsupported operation"
                );
                return Ok(DecisionResponse::unsupported_operation());
            }
        };

        let descriptor = kind.descriptor();
        let payload = (descriptor.decode)(envelope.content)
            .map_err(|fault| DispatchError::invalid_payload(kind, fault))?;
        let content = payload
            .to_json()
            .map_err(|source| DispatchError::encode(kind, source))?;

        if request.deadline_passed() {
            return Err(DispatchError::deadline_exceeded(kind));
        }

        let op = envelope.op.unwrap_or_else(|| kind.as_str().to_owned());
        let entry = AuditEntry::new(request.endpoint.as_str(), op, content.clone())
            .with_req_id(request.correlation_id)
            .with_version(envelope.version)
            .with_query(request.query_op, request.query_version);
        self.sink.append(kind, &entry)?;

        debug!(
            target: DISPATCH_TARGET,
            endpoint = %request.endpoint,
            operation = %kind,
            entry = %entry.id,
            "plugin request recorded"
        );
        Ok(DecisionResponse::for_policy(
            descriptor.response_policy,
            content,
        ))
    }

    /// Returns the recorded entries for `kind`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Audit`] when the sink cannot be read.
    pub fn audit_log(&self, kind: OperationKind) -> Result<Vec<AuditEntry>, DispatchError> {
        Ok(self.sink.entries(kind)?)
    }
}
