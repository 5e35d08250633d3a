//! JSON-RPC 2.0 envelope types shared by every transport.
//!
//! Deliberately narrower than a general-purpose JSON-RPC implementation:
//! batch requests are not modeled because the HTTP transport rejects them
//! outright (see `oneagent-mcp-http`), and Mission-Control WS never uses
//! this envelope at all.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ErrorCode, McpError};

/// The only JSON-RPC version this core speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request/response identifier: string, number, or null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier
    Str(String),
    /// Numeric identifier
    Num(i64),
    /// Null identifier (only legal on notifications/parse-error responses)
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Str(s) => write!(f, "{s}"),
            RequestId::Num(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// Marker type that serializes/deserializes as the literal string `"2.0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        match raw.as_str() {
            Some(JSONRPC_VERSION) => Ok(JsonRpcVersion),
            _ => Err(serde::de::Error::custom("jsonrpc must equal \"2.0\"")),
        }
    }
}

/// A parsed JSON-RPC request or notification.
///
/// `id: None` distinguishes a notification (no response expected) from a
/// request carrying `RequestId::Null`, which is legal and distinct.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    /// Must be `"2.0"`.
    pub jsonrpc: JsonRpcVersion,
    /// Method name; must be non-empty.
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    /// A notification never expects a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate shape: `jsonrpc == "2.0"`, non-empty method.
    /// (The `jsonrpc` field itself is already validated at deserialization
    /// time by [`JsonRpcVersion`]; this re-checks `method` since an empty
    /// string still deserializes successfully.)
    pub fn validate(&self) -> Result<(), McpError> {
        if self.method.is_empty() {
            return Err(McpError::new(
                ErrorCode::InvalidRequest,
                "method must be a non-empty string",
            ));
        }
        Ok(())
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric JSON-RPC error code.
    pub code: i64,
    /// Human-readable message; must not leak internal detail.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        JsonRpcError {
            code: err.code.jsonrpc_code().unwrap_or(-32603),
            message: err.message.clone(),
            data: err.data.clone(),
        }
    }
}

/// A JSON-RPC response: exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: JsonRpcVersion,
    /// `id` of the originating request. `RequestId::Null` for parse errors
    /// where no id could be recovered.
    pub id: RequestId,
    /// Result payload, mutually exclusive with `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload, mutually exclusive with `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response from a canonical [`McpError`].
    pub fn error(id: RequestId, err: &McpError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result: None,
            error: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_jsonrpc_version() {
        let raw = serde_json::json!({"jsonrpc": "1.0", "method": "ping", "id": 1});
        let parsed: Result<JsonRpcRequest, _> = serde_json::from_value(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn notification_has_no_id() {
        let raw = serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let parsed: JsonRpcRequest = serde_json::from_value(raw).unwrap();
        assert!(parsed.is_notification());
    }

    #[test]
    fn request_with_null_id_is_not_a_notification() {
        let raw = serde_json::json!({"jsonrpc": "2.0", "method": "ping", "id": null});
        let parsed: JsonRpcRequest = serde_json::from_value(raw).unwrap();
        assert!(!parsed.is_notification());
        assert_eq!(parsed.id, Some(RequestId::Null));
    }

    #[test]
    fn empty_method_is_rejected_on_validate() {
        let req = JsonRpcRequest {
            jsonrpc: JsonRpcVersion,
            method: String::new(),
            params: None,
            id: Some(RequestId::Num(1)),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn response_serializes_result_xor_error() {
        let resp = JsonRpcResponse::success(RequestId::Num(1), serde_json::json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_some());
        assert!(value.get("error").is_none());
    }
}
