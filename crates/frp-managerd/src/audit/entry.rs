use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// A durable record of one validated plugin operation.
///
/// Entries are created by the dispatcher after payload validation and are
/// never mutated afterwards. `timestamp` is the capture time on the manager,
/// not the time claimed by the frp server inside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier assigned at capture.
    pub id: Uuid,
    /// Endpoint tag the request arrived on (`user-manager`, `port-manager`).
    pub endpoint: String,
    /// Correlation id from the `X-Frp-Reqid` header.
    pub req_id: Option<String>,
    /// Operation name exactly as sent in the envelope.
    pub op: String,
    /// Protocol version from the envelope.
    pub version: Option<String>,
    /// Informational `op` query parameter.
    pub query_op: Option<String>,
    /// Informational `version` query parameter.
    pub query_version: Option<String>,
    /// Capture time (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// The validated payload, re-serialised.
    pub content: Value,
}

impl AuditEntry {
    /// Creates an entry stamped with a fresh id and the current UTC time.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, op: impl Into<String>, content: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint: endpoint.into(),
            req_id: None,
            op: op.into(),
            version: None,
            query_op: None,
            query_version: None,
            timestamp: OffsetDateTime::now_utc(),
            content,
        }
    }

    /// Attaches the caller-supplied correlation id.
    #[must_use]
    pub fn with_req_id(mut self, req_id: Option<String>) -> Self {
        self.req_id = req_id;
        self
    }

    /// Attaches the envelope's protocol version.
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Attaches the informational query parameters.
    #[must_use]
    pub fn with_query(mut self, query_op: Option<String>, query_version: Option<String>) -> Self {
        self.query_op = query_op;
        self.query_version = query_version;
        self
    }
}
