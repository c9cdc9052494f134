//! Decision responses returned to the frp server.
//!
//! frp reads three keys from a plugin response: `reject`, `reject_reason`
//! and `unchange`. When `unchange` is `false` it replaces the operation
//! content with the returned `content`.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Reject reason sent for operations the registry does not know.
pub const UNSUPPORTED_OPERATION: &str = "Unsupported operation";

/// How a successfully audited operation is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// Allow the operation and leave its content untouched.
    AcceptUnchanged,
    /// Allow the operation and return the validated content.
    EchoContent,
}

/// Decision sent back for one plugin request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionResponse {
    /// Allow, content unchanged.
    Accept,
    /// Refuse with a reason.
    Reject {
        /// Human-readable reason forwarded to the frp client.
        reason: String,
    },
    /// Allow with the given content.
    Modify {
        /// Content frp should continue with.
        content: Value,
    },
}

impl DecisionResponse {
    /// Builds the response for an audited operation.
    #[must_use]
    pub fn for_policy(policy: ResponsePolicy, content: Value) -> Self {
        match policy {
            ResponsePolicy::AcceptUnchanged => Self::Accept,
            ResponsePolicy::EchoContent => Self::Modify { content },
        }
    }

    /// Creates a rejection with the given reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: reason.into(),
        }
    }

    /// Rejection sent for unrecognised or missing operation names.
    #[must_use]
    pub fn unsupported_operation() -> Self {
        Self::reject(UNSUPPORTED_OPERATION)
    }

    /// Returns `true` when the decision refuses the operation.
    #[must_use]
    pub const fn is_reject(&self) -> bool {
        matches!(self, Self::Reject { .. })
    }
}

#[derive(Serialize)]
struct WireDecision<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reject: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reject_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unchange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a Value>,
}

impl Serialize for DecisionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Accept => WireDecision {
                reject: Some(false),
                reject_reason: None,
                unchange: Some(true),
                content: None,
            },
            Self::Reject { reason } => WireDecision {
                reject: Some(true),
                reject_reason: Some(reason),
                unchange: None,
                content: None,
            },
            Self::Modify { content } => WireDecision {
                reject: None,
                reject_reason: None,
                unchange: Some(false),
                content: Some(content),
            },
        };
        wire.serialize(serializer)
    }
}
