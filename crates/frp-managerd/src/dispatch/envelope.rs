//! Envelope decoding for plugin requests.
//!
//! The frp server wraps every operation in `{"version", "op", "content"}`.
//! Only the envelope is decoded here; `content` stays untyped until the
//! registry has resolved the operation.

use serde_json::{Map, Value};

use super::errors::DispatchError;

/// Decoded request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcEnvelope {
    /// Protocol version announced by the frp server.
    pub version: Option<String>,
    /// Operation name, unresolved.
    pub op: Option<String>,
    /// Operation content, undecoded.
    pub content: Option<Value>,
}

impl RpcEnvelope {
    /// Parses a request body.
    ///
    /// Keys are matched case-insensitively, with an exact-case key taking
    /// precedence. An absent or unrecognised `op` is not an error here.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MalformedEnvelope`] when the body is not JSON,
    /// is not an object, or carries a non-string `op` or `version`.
    pub fn decode(body: &[u8]) -> Result<Self, DispatchError> {
        let value: Value = serde_json::from_slice(body).map_err(DispatchError::from_json_error)?;
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(DispatchError::malformed(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )));
            }
        };

        let version = string_field(&mut object, "version")?;
        let op = string_field(&mut object, "op")?;
        let content = take_field(&mut object, "content");
        Ok(Self {
            version,
            op,
            content,
        })
    }

    /// Operation name exactly as sent.
    #[must_use]
    pub fn op_name(&self) -> Option<&str> {
        self.op.as_deref()
    }
}

fn take_field(object: &mut Map<String, Value>, name: &str) -> Option<Value> {
    if let Some(value) = object.remove(name) {
        return Some(value);
    }
    let key = object
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned()?;
    object.remove(&key)
}

fn string_field(object: &mut Map<String, Value>, name: &str) -> Result<Option<String>, DispatchError> {
    match take_field(object, name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(DispatchError::malformed(format!(
            "field `{name}` must be a string, found {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
