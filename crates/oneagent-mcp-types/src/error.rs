//! Canonical error taxonomy.
//!
//! One small set of codes is shared by every transport so that the same
//! failure always maps to the same JSON-RPC code, HTTP status, and
//! WS `protocol_error`/`subscription_error` code string. Transport crates
//! convert their local errors into [`McpError`] at the boundary; they
//! never invent new codes.

use std::fmt;

use serde_json::Value;

/// Canonical error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Inbound WS message failed shape validation.
    InvalidMessage,
    /// Inbound frame was not parseable JSON.
    InvalidJson,
    /// HTTP/stdio JSON-RPC envelope failed shape validation (batch, bad
    /// `jsonrpc`/`method`/`id`). Distinct from `InvalidMessage`, which is
    /// WS-specific, even though both map to JSON-RPC `-32600`.
    InvalidRequest,
    /// Subscribe to a channel that was never registered.
    UnknownChannel,
    /// Cancel of a mission id not owned by the requesting connection.
    UnknownMission,
    /// HTTP `Mcp-Session-Id` did not resolve to a live session.
    SessionNotFound,
    /// Origin validator rejected the request.
    OriginDenied,
    /// MCP method has no dispatcher entry.
    MethodNotFound,
    /// Params failed shape validation for a known method.
    InvalidParams,
    /// Unhandled exception at a transport or dispatch boundary.
    InternalError,
}

impl ErrorCode {
    /// The wire string used in WS `protocol_error`/`subscription_error`
    /// frames, e.g. `"unknown_channel"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidMessage => "invalid_message",
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::UnknownChannel => "unknown_channel",
            ErrorCode::UnknownMission => "unknown_mission",
            ErrorCode::SessionNotFound => "session_not_found",
            ErrorCode::OriginDenied => "origin_denied",
            ErrorCode::MethodNotFound => "method_not_found",
            ErrorCode::InvalidParams => "invalid_params",
            ErrorCode::InternalError => "internal_error",
        }
    }

    /// JSON-RPC numeric code, when this error has one.
    pub fn jsonrpc_code(self) -> Option<i64> {
        match self {
            ErrorCode::InvalidMessage | ErrorCode::InvalidRequest => Some(-32600),
            ErrorCode::InvalidJson => Some(-32700),
            ErrorCode::UnknownChannel | ErrorCode::UnknownMission => None,
            ErrorCode::SessionNotFound | ErrorCode::InvalidParams => Some(-32602),
            ErrorCode::OriginDenied => None,
            ErrorCode::MethodNotFound => Some(-32601),
            ErrorCode::InternalError => Some(-32603),
        }
    }

    /// HTTP status this error maps to when it aborts an HTTP request
    /// outright.
    pub fn http_status(self) -> Option<u16> {
        match self {
            ErrorCode::OriginDenied => Some(403),
            ErrorCode::SessionNotFound => Some(404),
            ErrorCode::InvalidRequest | ErrorCode::InvalidJson => Some(400),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical, transport-agnostic error carrying its taxonomy code plus a
/// sanitized user-facing message. `data` may carry structured detail but
/// must never include raw exception internals.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct McpError {
    /// Canonical code.
    pub code: ErrorCode,
    /// Sanitized, user-facing message.
    pub message: String,
    /// Optional structured detail (e.g. `{"timestamp": ...}`).
    pub data: Option<Value>,
}

impl McpError {
    /// Construct a new error with no extra data.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// `-32601 Method not found`.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("method not found: {method}"),
        )
    }

    /// `-32602 Invalid params`.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// `-32603 Internal error`, with a sanitized timestamp attached.
    /// Any unhandled exception maps here, carrying `data.timestamp` only —
    /// never raw exception internals.
    pub fn internal(message: impl Into<String>, timestamp_rfc3339: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
            .with_data(serde_json::json!({ "timestamp": timestamp_rfc3339.into() }))
    }

    /// `-32600 Invalid Request` (HTTP/stdio envelope violation).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// WS inbound message shape violation.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMessage, message)
    }

    /// Unparseable JSON on any framed transport.
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidJson, message)
    }

    /// HTTP session id not recognized.
    pub fn session_not_found(session_id: &str) -> Self {
        Self::new(
            ErrorCode::SessionNotFound,
            format!("unknown session: {session_id}"),
        )
    }

    /// Origin validator rejection.
    pub fn origin_denied(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::OriginDenied, reason)
    }

    /// Subscribe to an unregistered channel.
    pub fn unknown_channel(name: &str) -> Self {
        Self::new(ErrorCode::UnknownChannel, format!("unknown channel: {name}"))
    }

    /// Cancel of a mission the connection does not own.
    pub fn unknown_mission(mission_id: &str) -> Self {
        Self::new(
            ErrorCode::UnknownMission,
            format!("unknown mission: {mission_id}"),
        )
    }
}
