//! Mapping from [`McpError`] to an HTTP response carrying a JSON-RPC error
//! envelope, matching the C13 taxonomy's `http_status` table.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oneagent_mcp_types::{JsonRpcResponse, McpError, RequestId};

/// Render `err` as a JSON-RPC error response with the canonical HTTP
/// status for its code, defaulting to `400 Bad Request` when the taxonomy
/// does not name one (`internal_error` and channel/mission-only codes fall
/// back to `500`).
pub fn error_response(id: RequestId, err: McpError) -> Response {
    let status = err
        .code
        .http_status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = JsonRpcResponse::error(id, &err);
    (status, Json(body)).into_response()
}
