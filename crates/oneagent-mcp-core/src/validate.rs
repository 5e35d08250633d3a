//! Inbound/Outbound Validators.
//!
//! Pulls the shape-checking usually inlined at the top of each
//! transport handler out into a shared pre-dispatch gate used by every
//! transport.

use oneagent_mcp_types::{ErrorCode, JsonRpcRequest, McpError};
use serde_json::Value;

/// One parsed, shape-valid Mission-Control inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `{"type":"subscribe","channels":[...]}`.
    Subscribe { channels: Vec<String> },
    /// `{"type":"unsubscribe","channels":[...]}`.
    Unsubscribe { channels: Vec<String> },
    /// `{"type":"ping"}`.
    Ping,
    /// `{"type":"whoami"}`.
    Whoami,
    /// `{"type":"mission_start","command":"..."}`.
    MissionStart { command: String },
    /// `{"type":"mission_cancel","missionId":"..."}`.
    MissionCancel { mission_id: String },
}

fn string_array(value: &Value, field: &str) -> Result<Vec<String>, McpError> {
    let arr = value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| McpError::invalid_message(format!("missing or non-array field '{field}'")))?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| McpError::invalid_message(format!("'{field}' must contain only strings")))
        })
        .collect()
}

fn required_str(value: &Value, field: &str) -> Result<String, McpError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| McpError::invalid_message(format!("missing or non-string field '{field}'")))
}

/// Parse one inbound Mission-Control frame. Any shape that does not match
/// one of the known `type`s produces `invalid_message`.
pub fn parse_inbound(value: &Value) -> Result<InboundMessage, McpError> {
    let msg_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::invalid_message("missing 'type' field"))?;

    match msg_type {
        "subscribe" => Ok(InboundMessage::Subscribe {
            channels: string_array(value, "channels")?,
        }),
        "unsubscribe" => Ok(InboundMessage::Unsubscribe {
            channels: string_array(value, "channels")?,
        }),
        "ping" => Ok(InboundMessage::Ping),
        "whoami" => Ok(InboundMessage::Whoami),
        "mission_start" => Ok(InboundMessage::MissionStart {
            command: required_str(value, "command")?,
        }),
        "mission_cancel" => Ok(InboundMessage::MissionCancel {
            mission_id: required_str(value, "missionId")?,
        }),
        other => Err(McpError::invalid_message(format!("unknown message type '{other}'"))),
    }
}

/// Best-effort shape check for an outbound frame: must contain `type`,
/// `id`, `timestamp`, `unix`, and `server{name,version}`. A failure here is
/// logged, never fatal — the frame is still sent.
pub fn validate_outbound(value: &Value) -> bool {
    let ok = value.get("type").and_then(Value::as_str).is_some()
        && value.get("id").is_some()
        && value.get("timestamp").and_then(Value::as_str).is_some()
        && value.get("unix").and_then(Value::as_i64).is_some()
        && value
            .get("server")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .is_some()
        && value
            .get("server")
            .and_then(|s| s.get("version"))
            .and_then(Value::as_str)
            .is_some();

    if !ok {
        tracing::warn!(frame = %value, "outbound frame failed shape validation");
    }
    ok
}

/// Validate a parsed JSON-RPC request beyond what `serde` already enforces
/// structurally. The version and id
/// shape are enforced by [`oneagent_mcp_types::JsonRpcVersion`] and
/// [`oneagent_mcp_types::RequestId`] at deserialization time; this adds the
/// one check serde cannot express, non-empty `method`.
pub fn validate_jsonrpc_request(request: &JsonRpcRequest) -> Result<(), McpError> {
    request.validate()
}

/// Reject a raw JSON payload that parses as a top-level array.
pub fn reject_batch(value: &Value) -> Result<(), McpError> {
    if value.is_array() {
        return Err(McpError::new(ErrorCode::InvalidRequest, "batch requests are not supported"));
    }
    Ok(())
}
