//! Serve loop: read a framed request, dispatch it, write a framed
//! response. Notifications produce no response. stdout carries only
//! protocol frames; every diagnostic goes through `tracing` (stderr by
//! convention of whichever subscriber the binary installs).

use std::sync::Arc;

use chrono::Utc;
use oneagent_mcp_protocol::{Dispatcher, Engine};
use oneagent_mcp_types::{ErrorCode, JsonRpcRequest, JsonRpcResponse, McpError, RequestId};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::framing::{read_frame, write_frame, FramingError};

/// Default cap on a single frame's payload size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Serve JSON-RPC requests framed over `reader`/`writer` until the stream
/// closes cleanly between frames. Returns on clean shutdown; propagates
/// only unrecoverable I/O errors.
pub async fn serve<E, R, W>(
    dispatcher: Arc<Dispatcher<E>>,
    mut reader: R,
    mut writer: W,
    max_body_bytes: usize,
) -> std::io::Result<()>
where
    E: Engine,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = match read_frame(&mut reader, max_body_bytes).await {
            Ok(None) => return Ok(()),
            Ok(Some(bytes)) => bytes,
            Err(FramingError::Io(err)) => return Err(err),
            Err(FramingError::UnexpectedEof) => {
                tracing::warn!("stdin closed mid-frame, shutting down");
                return Ok(());
            }
            Err(err) => {
                // Header-block failures: the frame is unrecoverable (we
                // never learned its length or it overflowed the limit),
                // but the stream is realigned at the next frame boundary.
                tracing::warn!(error = %err, "malformed stdio frame, resyncing");
                continue;
            }
        };

        if let Some(response) = handle_frame(&dispatcher, &frame).await {
            let payload = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
            write_frame(&mut writer, &payload).await?;
        }
    }
}

async fn handle_frame<E: Engine>(dispatcher: &Dispatcher<E>, frame: &[u8]) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_slice(frame) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "stdio frame was not valid JSON");
            return Some(JsonRpcResponse::error(RequestId::Null, &McpError::invalid_json(err.to_string())));
        }
    };

    if value.is_array() {
        return Some(JsonRpcResponse::error(
            RequestId::Null,
            &McpError::new(ErrorCode::InvalidRequest, "batch requests are not supported"),
        ));
    }

    let recovered_id = value
        .get("id")
        .and_then(|raw| serde_json::from_value::<RequestId>(raw.clone()).ok())
        .unwrap_or(RequestId::Null);

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "stdio frame did not match the JSON-RPC envelope");
            return Some(JsonRpcResponse::error(recovered_id, &McpError::invalid_request(err.to_string())));
        }
    };

    if let Err(err) = request.validate() {
        return Some(JsonRpcResponse::error(recovered_id, &err));
    }

    let is_notification = request.is_notification();
    let response = dispatcher.dispatch(&request, Utc::now()).await;
    if is_notification {
        None
    } else {
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use oneagent_mcp_protocol::{DispatcherConfig, EngineRequest, EngineResponse, Prompt, Resource, ServerInfo, Tool};
    use serde_json::json;
    use std::io::Cursor;
    use tokio::io::BufReader;

    struct EchoEngine;

    #[async_trait]
    impl Engine for EchoEngine {
        async fn get_available_tools(&self) -> Vec<Tool> {
            Vec::new()
        }
        async fn get_available_resources(&self) -> Vec<Resource> {
            Vec::new()
        }
        async fn get_available_prompts(&self) -> Vec<Prompt> {
            Vec::new()
        }
        async fn process_request(&self, request: EngineRequest) -> EngineResponse {
            EngineResponse::ok(request.params)
        }
    }

    fn dispatcher() -> Arc<Dispatcher<EchoEngine>> {
        Arc::new(Dispatcher::new(
            Arc::new(EchoEngine),
            DispatcherConfig {
                server_info: ServerInfo { name: "oneagent-mcp".into(), version: "0.1.0".into() },
                tool_sets_supported: false,
                resource_subscribe_supported: false,
                sampling_enabled: None,
                oauth2: None,
            },
        ))
    }

    fn framed(body: &Value) -> Vec<u8> {
        let payload = body.to_string();
        format!("Content-Length: {}\r\n\r\n{payload}", payload.len()).into_bytes()
    }

    #[tokio::test]
    async fn initialize_request_gets_a_framed_response() {
        let request = json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2025-06-18", "capabilities": {}, "clientInfo": {"name": "c", "version": "1"}}
        });
        let reader = BufReader::new(Cursor::new(framed(&request)));
        let mut out = Vec::new();
        serve(dispatcher(), reader, &mut out, DEFAULT_MAX_BODY_BYTES).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Content-Length:"));
        let body_start = out.find("\r\n\r\n").unwrap() + 4;
        let response: Value = serde_json::from_str(&out[body_start..]).unwrap();
        assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
    }

    #[tokio::test]
    async fn notification_produces_no_output() {
        let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let reader = BufReader::new(Cursor::new(framed(&notification)));
        let mut out = Vec::new();
        serve(dispatcher(), reader, &mut out, DEFAULT_MAX_BODY_BYTES).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn invalid_json_gets_parse_error_with_null_id() {
        let mut raw = b"not json at all".to_vec();
        let framed = format!("Content-Length: {}\r\n\r\n", raw.len());
        let mut input = framed.into_bytes();
        input.append(&mut raw);
        let reader = BufReader::new(Cursor::new(input));
        let mut out = Vec::new();
        serve(dispatcher(), reader, &mut out, DEFAULT_MAX_BODY_BYTES).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        let body_start = out.find("\r\n\r\n").unwrap() + 4;
        let response: Value = serde_json::from_str(&out[body_start..]).unwrap();
        assert_eq!(response["error"]["code"], -32700);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn envelope_violation_gets_invalid_request_not_parse_error() {
        let bad_envelope = json!({"jsonrpc": "1.0", "id": 1, "method": "initialize"});
        let reader = BufReader::new(Cursor::new(framed(&bad_envelope)));
        let mut out = Vec::new();
        serve(dispatcher(), reader, &mut out, DEFAULT_MAX_BODY_BYTES).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        let body_start = out.find("\r\n\r\n").unwrap() + 4;
        let response: Value = serde_json::from_str(&out[body_start..]).unwrap();
        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn batch_array_is_rejected() {
        let batch = json!([{"jsonrpc": "2.0", "id": 1, "method": "initialize"}]);
        let reader = BufReader::new(Cursor::new(framed(&batch)));
        let mut out = Vec::new();
        serve(dispatcher(), reader, &mut out, DEFAULT_MAX_BODY_BYTES).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        let body_start = out.find("\r\n\r\n").unwrap() + 4;
        let response: Value = serde_json::from_str(&out[body_start..]).unwrap();
        assert_eq!(response["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn malformed_frame_header_resyncs_then_serves_next_request() {
        let mut input = b"Content-Length: nope\r\n\r\n".to_vec();
        let request = json!({"jsonrpc": "2.0", "id": 9, "method": "tools/list"});
        input.extend_from_slice(&framed(&request));
        let reader = BufReader::new(Cursor::new(input));
        let mut out = Vec::new();
        serve(dispatcher(), reader, &mut out, DEFAULT_MAX_BODY_BYTES).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        let body_start = out.find("\r\n\r\n").unwrap() + 4;
        let response: Value = serde_json::from_str(&out[body_start..]).unwrap();
        assert_eq!(response["id"], 9);
        assert_eq!(response["result"]["tools"], json!([]));
    }
}
