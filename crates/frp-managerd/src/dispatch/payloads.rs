//! Typed payload records and their validators.
//!
//! The envelope keeps `content` as an untyped JSON value until the operation
//! is known. [`decode_payload`] then binds it to the operation's record.
//! Validation is structural only: absent fields fall back to unset/zero
//! values, while wrong JSON types (including `null` for a number or flag) are
//! rejected.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::OperationKind;

/// Why a payload could not be bound to its operation's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadFault {
    /// `content` was absent or `null`.
    Missing,
    /// `content` was present but did not match the record's shape.
    Malformed(String),
}

/// A JSON record with a fixed set of snake_case field names.
///
/// Field names are matched case-insensitively before decoding, mirroring
/// how frp-compatible managers have historically accepted payloads.
pub trait WirePayload: DeserializeOwned + Serialize {
    /// Canonical field names of the record.
    const FIELDS: &'static [&'static str];
    /// Nested records, as `(field, nested field names)` pairs.
    const NESTED: &'static [(&'static str, &'static [&'static str])] = &[];
}

/// Binds untyped envelope content to the record `T`.
///
/// # Errors
///
/// Returns [`PayloadFault::Missing`] when `content` is absent or `null`, and
/// [`PayloadFault::Malformed`] when a field has the wrong JSON type or the
/// content is not an object.
pub fn decode_payload<T: WirePayload>(content: Option<Value>) -> Result<T, PayloadFault> {
    let value = match content {
        None | Some(Value::Null) => return Err(PayloadFault::Missing),
        Some(Value::Object(mut object)) => {
            fold_field_names(&mut object, T::FIELDS);
            for (field, nested_fields) in T::NESTED {
                if let Some(Value::Object(nested)) = object.get_mut(*field) {
                    fold_field_names(nested, nested_fields);
                }
            }
            Value::Object(object)
        }
        Some(other) => other,
    };
    serde_json::from_value(value).map_err(|error| PayloadFault::Malformed(error.to_string()))
}

/// Renames keys that case-insensitively match a canonical field name.
///
/// Keys of user-data maps (`metas`, `headers`) are never visited because
/// only the record's own keys are folded.
fn fold_field_names(object: &mut Map<String, Value>, fields: &[&str]) {
    let original = std::mem::take(object);
    for (key, value) in original {
        let name = fields
            .iter()
            .find(|field| field.eq_ignore_ascii_case(&key))
            .map_or(key, |field| (*field).to_owned());
        object.insert(name, value);
    }
}

/// Identity of the frp client that owns a proxy or connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRef {
    /// User name configured on the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Client metadata (`metadatas` in the client configuration).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metas: Option<BTreeMap<String, String>>,
    /// Run id of the client session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

const USER_REF_FIELDS: &[&str] = &["user", "metas", "run_id"];

/// `Login` operation content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginContent {
    /// Client version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Client host name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Client operating system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Client architecture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// User name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Client-claimed Unix timestamp.
    pub timestamp: i64,
    /// Authentication key derived by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege_key: Option<String>,
    /// Run id of the client session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Number of pre-established work connections.
    pub pool_count: i32,
    /// Client metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metas: Option<BTreeMap<String, String>>,
    /// Address the client connected from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
}

impl WirePayload for LoginContent {
    const FIELDS: &'static [&'static str] = &[
        "version",
        "hostname",
        "os",
        "arch",
        "user",
        "timestamp",
        "privilege_key",
        "run_id",
        "pool_count",
        "metas",
        "client_address",
    ];
}

/// `NewProxy` operation content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProxyContent {
    /// Owning client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// Proxy name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_name: Option<String>,
    /// Proxy type (`tcp`, `http`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
    /// Whether traffic is encrypted between client and server.
    pub use_encryption: bool,
    /// Whether traffic is compressed between client and server.
    pub use_compression: bool,
    /// Bandwidth limit, for example `1MB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_limit: Option<String>,
    /// Where the bandwidth limit is enforced (`client` or `server`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_limit_mode: Option<String>,
    /// Load-balancing group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Load-balancing group key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    /// Requested remote port for `tcp`/`udp` proxies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<i32>,
    /// Custom domains for `http`/`https` proxies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domains: Option<Vec<String>>,
    /// Subdomain for `http`/`https` proxies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// URL path prefixes routed to the proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
    /// HTTP basic-auth user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_user: Option<String>,
    /// HTTP basic-auth password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_pwd: Option<String>,
    /// Host header rewrite target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_header_rewrite: Option<String>,
    /// Request headers set by the proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Secret key for `stcp`/`xtcp`/`sudp` proxies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sk: Option<String>,
    /// Multiplexer for `tcpmux` proxies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplexer: Option<String>,
    /// Proxy metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metas: Option<BTreeMap<String, String>>,
}

impl WirePayload for NewProxyContent {
    const FIELDS: &'static [&'static str] = &[
        "user",
        "proxy_name",
        "proxy_type",
        "use_encryption",
        "use_compression",
        "bandwidth_limit",
        "bandwidth_limit_mode",
        "group",
        "group_key",
        "remote_port",
        "custom_domains",
        "subdomain",
        "locations",
        "http_user",
        "http_pwd",
        "host_header_rewrite",
        "headers",
        "sk",
        "multiplexer",
        "metas",
    ];
    const NESTED: &'static [(&'static str, &'static [&'static str])] =
        &[("user", USER_REF_FIELDS)];
}

/// `CloseProxy` operation content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseProxyContent {
    /// Owning client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// Proxy being closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_name: Option<String>,
}

impl WirePayload for CloseProxyContent {
    const FIELDS: &'static [&'static str] = &["user", "proxy_name"];
    const NESTED: &'static [(&'static str, &'static [&'static str])] =
        &[("user", USER_REF_FIELDS)];
}

/// `Ping` operation content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingContent {
    /// Pinging client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// Client-claimed Unix timestamp.
    pub timestamp: i64,
    /// Authentication key derived by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege_key: Option<String>,
}

impl WirePayload for PingContent {
    const FIELDS: &'static [&'static str] = &["user", "timestamp", "privilege_key"];
    const NESTED: &'static [(&'static str, &'static [&'static str])] =
        &[("user", USER_REF_FIELDS)];
}

/// `NewWorkConn` operation content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewWorkConnContent {
    /// Owning client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// Run id of the client session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Client-claimed Unix timestamp.
    pub timestamp: i64,
    /// Authentication key derived by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege_key: Option<String>,
}

impl WirePayload for NewWorkConnContent {
    const FIELDS: &'static [&'static str] = &["user", "run_id", "timestamp", "privilege_key"];
    const NESTED: &'static [(&'static str, &'static [&'static str])] =
        &[("user", USER_REF_FIELDS)];
}

/// `NewUserConn` operation content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUserConnContent {
    /// Client owning the proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// Proxy being visited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_name: Option<String>,
    /// Type of the proxy being visited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
    /// Address of the visitor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

impl WirePayload for NewUserConnContent {
    const FIELDS: &'static [&'static str] = &["user", "proxy_name", "proxy_type", "remote_addr"];
    const NESTED: &'static [(&'static str, &'static [&'static str])] =
        &[("user", USER_REF_FIELDS)];
}

/// A validated payload of any supported operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationPayload {
    /// `Login` content.
    Login(LoginContent),
    /// `NewProxy` content.
    NewProxy(NewProxyContent),
    /// `CloseProxy` content.
    CloseProxy(CloseProxyContent),
    /// `Ping` content.
    Ping(PingContent),
    /// `NewWorkConn` content.
    NewWorkConn(NewWorkConnContent),
    /// `NewUserConn` content.
    NewUserConn(NewUserConnContent),
}

impl OperationPayload {
    /// Operation kind this payload belongs to.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Login(_) => OperationKind::Login,
            Self::NewProxy(_) => OperationKind::NewProxy,
            Self::CloseProxy(_) => OperationKind::CloseProxy,
            Self::Ping(_) => OperationKind::Ping,
            Self::NewWorkConn(_) => OperationKind::NewWorkConn,
            Self::NewUserConn(_) => OperationKind::NewUserConn,
        }
    }

    /// Serialises the payload with its wire field names.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error; the records only hold strings, numbers
    /// and string maps, so this does not fail in practice.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn new_proxy_tolerates_omitted_optional_fields() {
        let content = json!({
            "proxy_name": "web1",
            "proxy_type": "http",
            "user": {"user": "alice", "run_id": "r1"}
        });
        let decoded = decode_payload::<NewProxyContent>(Some(content)).expect("decode");

        assert_eq!(decoded.proxy_name.as_deref(), Some("web1"));
        assert_eq!(decoded.remote_port, None);
        assert_eq!(decoded.custom_domains, None);
        assert_eq!(decoded.metas, None);
        let user = decoded.user.expect("user present");
        assert_eq!(user.user.as_deref(), Some("alice"));
        assert_eq!(user.run_id.as_deref(), Some("r1"));
    }

    #[test]
    fn field_names_match_case_insensitively() {
        let content = json!({
            "Proxy_Name": "web1",
            "REMOTE_PORT": 6000,
            "User": {"USER": "alice", "Run_Id": "r1"}
        });
        let decoded = decode_payload::<NewProxyContent>(Some(content)).expect("decode");

        assert_eq!(decoded.proxy_name.as_deref(), Some("web1"));
        assert_eq!(decoded.remote_port, Some(6000));
        let user = decoded.user.expect("user present");
        assert_eq!(user.user.as_deref(), Some("alice"));
        assert_eq!(user.run_id.as_deref(), Some("r1"));
    }

    #[test]
    fn map_keys_keep_their_case() {
        let content = json!({
            "user": {"user": "alice", "metas": {"Region": "EU"}},
            "headers": {"X-Custom": "1"}
        });
        let decoded = decode_payload::<NewProxyContent>(Some(content)).expect("decode");

        let metas = decoded.user.and_then(|user| user.metas).expect("metas");
        assert_eq!(metas.get("Region").map(String::as_str), Some("EU"));
        let headers = decoded.headers.expect("headers");
        assert!(headers.contains_key("X-Custom"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(Value::Null))]
    fn missing_content_is_reported(#[case] content: Option<Value>) {
        let result = decode_payload::<PingContent>(content);
        assert_eq!(result, Err(PayloadFault::Missing));
    }

    #[rstest]
    #[case(json!({"timestamp": "yesterday"}))]
    #[case(json!({"timestamp": null}))]
    #[case(json!({"user": "alice"}))]
    #[case(json!("ping"))]
    #[case(json!([1, 2, 3]))]
    fn mistyped_content_is_malformed(#[case] content: Value) {
        let result = decode_payload::<PingContent>(Some(content));
        assert!(matches!(result, Err(PayloadFault::Malformed(_))), "{result:?}");
    }

    #[test]
    fn login_uses_plain_user_string() {
        let content = json!({
            "version": "0.61.0",
            "user": "alice",
            "timestamp": 1_700_000_000,
            "pool_count": 2,
            "metas": {"token": "abc"},
            "client_address": "10.0.0.2:51000"
        });
        let decoded = decode_payload::<LoginContent>(Some(content)).expect("decode");

        assert_eq!(decoded.user.as_deref(), Some("alice"));
        assert_eq!(decoded.pool_count, 2);
        assert_eq!(decoded.client_address.as_deref(), Some("10.0.0.2:51000"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let content = json!({"proxy_name": "db", "annotations": {"a": "b"}});
        let decoded = decode_payload::<CloseProxyContent>(Some(content)).expect("decode");
        assert_eq!(decoded.proxy_name.as_deref(), Some("db"));
    }

    #[test]
    fn serialises_with_wire_names_and_skips_unset_fields() {
        let payload = OperationPayload::NewUserConn(NewUserConnContent {
            proxy_name: Some("ssh".to_owned()),
            remote_addr: Some("1.2.3.4:5555".to_owned()),
            ..NewUserConnContent::default()
        });
        let value = payload.to_json().expect("serialise");

        assert_eq!(value, json!({"proxy_name": "ssh", "remote_addr": "1.2.3.4:5555"}));
        assert_eq!(payload.kind(), OperationKind::NewUserConn);
    }
}
