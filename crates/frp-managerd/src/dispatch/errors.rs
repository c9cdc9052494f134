//! Error types for plugin request dispatch.
//!
//! Every variant is local to the request that raised it. Transport code maps
//! each variant onto an HTTP status via [`DispatchError::class`].

use thiserror::Error;

use super::payloads::PayloadFault;
use super::registry::OperationKind;
use crate::audit::AuditError;

/// Failure classes the transport maps to an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The caller sent something unusable (`400`).
    BadRequest,
    /// Audit storage is unavailable (`503`).
    Unavailable,
    /// The request ran out of time before it was recorded (`504`).
    Timeout,
    /// The manager failed on its own (`500`).
    Internal,
}

/// Errors surfaced while dispatching a plugin request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The body is not a JSON object with string `op` and `version` fields.
    #[error("Error parsing JSON: {message}")]
    MalformedEnvelope {
        /// Parser diagnostic.
        message: String,
        /// Underlying parser error, when the body was not valid JSON.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The operation is known but its content is missing or mistyped.
    #[error("{}", invalid_payload_message(.operation, .fault))]
    InvalidPayload {
        /// Operation whose content failed validation.
        operation: OperationKind,
        /// What was wrong with the content.
        fault: PayloadFault,
    },

    /// The validated payload could not be rendered back to JSON.
    #[error("failed to encode {operation} content: {source}")]
    Encode {
        /// Operation whose payload failed to encode.
        operation: OperationKind,
        /// Serialiser error.
        #[source]
        source: serde_json::Error,
    },

    /// The audit entry could not be stored.
    #[error("audit log unavailable: {0}")]
    Audit(#[from] AuditError),

    /// The request deadline passed before the audit entry was written.
    #[error("{operation} request timed out before it was recorded")]
    DeadlineExceeded {
        /// Operation being dispatched.
        operation: OperationKind,
    },
}

fn invalid_payload_message(operation: &OperationKind, fault: &PayloadFault) -> String {
    match fault {
        PayloadFault::Missing => format!("{operation} content is null"),
        PayloadFault::Malformed(message) => format!("Error parsing {operation} content: {message}"),
    }
}

impl DispatchError {
    /// Creates a malformed envelope error from a parser error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedEnvelope {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed envelope error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid payload error.
    #[must_use]
    pub const fn invalid_payload(operation: OperationKind, fault: PayloadFault) -> Self {
        Self::InvalidPayload { operation, fault }
    }

    /// Creates a payload encoding error.
    #[must_use]
    pub const fn encode(operation: OperationKind, source: serde_json::Error) -> Self {
        Self::Encode { operation, source }
    }

    /// Creates a deadline error.
    #[must_use]
    pub const fn deadline_exceeded(operation: OperationKind) -> Self {
        Self::DeadlineExceeded { operation }
    }

    /// Classifies the error for the transport.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::MalformedEnvelope { .. } | Self::InvalidPayload { .. } => {
                FailureClass::BadRequest
            }
            Self::Audit(_) => FailureClass::Unavailable,
            Self::DeadlineExceeded { .. } => FailureClass::Timeout,
            Self::Encode { .. } => FailureClass::Internal,
        }
    }
}
