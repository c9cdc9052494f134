//! Operation registry for the frp server-plugin protocol.
//!
//! The protocol defines six operations. Each has one static
//! [`OperationDescriptor`] naming its wire name, audit channel, response
//! policy and payload validator. Adding an operation means adding an
//! [`OperationKind`] variant and its descriptor; the dispatcher's control
//! flow stays unchanged.

use std::fmt;

use serde_json::Value;

use super::payloads::{
    CloseProxyContent, LoginContent, NewProxyContent, NewUserConnContent, NewWorkConnContent,
    OperationPayload, PayloadFault, PingContent, decode_payload,
};
use super::response::ResponsePolicy;

/// Supported plugin operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A frp client logs in to the server.
    Login,
    /// A client registers a proxy.
    NewProxy,
    /// A proxy is torn down.
    CloseProxy,
    /// Client heartbeat.
    Ping,
    /// A client opens a work connection.
    NewWorkConn,
    /// A visitor connects to a proxy.
    NewUserConn,
}

/// Payload validator signature shared by every descriptor.
pub type PayloadDecoder = fn(Option<Value>) -> Result<OperationPayload, PayloadFault>;

/// Static description of one operation kind.
#[derive(Debug)]
pub struct OperationDescriptor {
    /// Operation kind described.
    pub kind: OperationKind,
    /// Canonical lower-case wire name.
    pub name: &'static str,
    /// Name of the audit log channel (file stem or table discriminator).
    pub audit_channel: &'static str,
    /// How the response is built after a successful audit append.
    pub response_policy: ResponsePolicy,
    /// Converts the envelope content into the typed payload.
    pub decode: PayloadDecoder,
}

static REGISTRY: [OperationDescriptor; 6] = [
    OperationDescriptor {
        kind: OperationKind::Login,
        name: "login",
        audit_channel: "login",
        response_policy: ResponsePolicy::AcceptUnchanged,
        decode: decode_login,
    },
    OperationDescriptor {
        kind: OperationKind::NewProxy,
        name: "newproxy",
        audit_channel: "newproxy",
        response_policy: ResponsePolicy::EchoContent,
        decode: decode_new_proxy,
    },
    OperationDescriptor {
        kind: OperationKind::CloseProxy,
        name: "closeproxy",
        audit_channel: "closeproxy",
        response_policy: ResponsePolicy::AcceptUnchanged,
        decode: decode_close_proxy,
    },
    OperationDescriptor {
        kind: OperationKind::Ping,
        name: "ping",
        audit_channel: "ping",
        response_policy: ResponsePolicy::AcceptUnchanged,
        decode: decode_ping,
    },
    OperationDescriptor {
        kind: OperationKind::NewWorkConn,
        name: "newworkconn",
        audit_channel: "newworkconn",
        response_policy: ResponsePolicy::AcceptUnchanged,
        decode: decode_new_work_conn,
    },
    OperationDescriptor {
        kind: OperationKind::NewUserConn,
        name: "newuserconn",
        audit_channel: "newuserconn",
        response_policy: ResponsePolicy::AcceptUnchanged,
        decode: decode_new_user_conn,
    },
];

impl OperationKind {
    /// Every supported kind, in registry order.
    pub const ALL: [Self; 6] = [
        Self::Login,
        Self::NewProxy,
        Self::CloseProxy,
        Self::Ping,
        Self::NewWorkConn,
        Self::NewUserConn,
    ];

    /// Parses an operation name, ignoring ASCII case. Whitespace is
    /// significant.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        descriptors()
            .iter()
            .find(|descriptor| descriptor.name.eq_ignore_ascii_case(value))
            .map(|descriptor| descriptor.kind)
    }

    /// Returns the static descriptor for this kind.
    #[must_use]
    pub fn descriptor(self) -> &'static OperationDescriptor {
        match self {
            Self::Login => &REGISTRY[0],
            Self::NewProxy => &REGISTRY[1],
            Self::CloseProxy => &REGISTRY[2],
            Self::Ping => &REGISTRY[3],
            Self::NewWorkConn => &REGISTRY[4],
            Self::NewUserConn => &REGISTRY[5],
        }
    }

    /// Canonical lower-case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of resolving an envelope's `op` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// The name matched a registry entry.
    Known(OperationKind),
    /// No registry entry matched; carries the raw name, if any was sent.
    Unknown(Option<String>),
}

/// Resolves an operation name against the registry.
#[must_use]
pub fn lookup(name: Option<&str>) -> Operation {
    match name.and_then(OperationKind::parse) {
        Some(kind) => Operation::Known(kind),
        None => Operation::Unknown(name.map(str::to_owned)),
    }
}

/// All registry entries.
#[must_use]
pub fn descriptors() -> &'static [OperationDescriptor] {
    &REGISTRY
}

fn decode_login(content: Option<Value>) -> Result<OperationPayload, PayloadFault> {
    decode_payload::<LoginContent>(content).map(OperationPayload::Login)
}

fn decode_new_proxy(content: Option<Value>) -> Result<OperationPayload, PayloadFault> {
    decode_payload::<NewProxyContent>(content).map(OperationPayload::NewProxy)
}

fn decode_close_proxy(content: Option<Value>) -> Result<OperationPayload, PayloadFault> {
    decode_payload::<CloseProxyContent>(content).map(OperationPayload::CloseProxy)
}

fn decode_ping(content: Option<Value>) -> Result<OperationPayload, PayloadFault> {
    decode_payload::<PingContent>(content).map(OperationPayload::Ping)
}

fn decode_new_work_conn(content: Option<Value>) -> Result<OperationPayload, PayloadFault> {
    decode_payload::<NewWorkConnContent>(content).map(OperationPayload::NewWorkConn)
}

fn decode_new_user_conn(content: Option<Value>) -> Result<OperationPayload, PayloadFault> {
    decode_payload::<NewUserConnContent>(content).map(OperationPayload::NewUserConn)
}
