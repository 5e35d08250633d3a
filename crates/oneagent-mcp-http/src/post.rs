//! `POST /mcp`: validate the JSON-RPC envelope, resolve or create a
//! session, dispatch, and shape the response per §6.1's header contract.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use oneagent_mcp_core::{reject_batch, validate_jsonrpc_request};
use oneagent_mcp_protocol::Engine;
use oneagent_mcp_types::{JsonRpcRequest, JsonRpcResponse, McpError, RequestId};
use serde_json::Value;

use crate::error::error_response;
use crate::headers as hdr;
use crate::session::{create_session, require_session};
use crate::state::HttpState;

fn response_headers<E: Engine>(state: &HttpState<E>, session_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        hdr::MCP_SESSION_ID,
        HeaderValue::from_str(session_id).unwrap_or_else(|_| HeaderValue::from_static("invalid")),
    );
    headers.insert(
        hdr::MCP_PROTOCOL_VERSION,
        HeaderValue::from_str(&state.config.protocol_version).unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    );
    headers
}

/// Handle one `POST /mcp` body. Batches are rejected outright; a
/// notification gets `202 Accepted` with no body; a request gets its
/// dispatched JSON-RPC response.
pub async fn mcp_post<E: Engine>(State(state): State<HttpState<E>>, headers: HeaderMap, body: Bytes) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let decision = state.origin.validate(origin);
    if !decision.allowed {
        return error_response(RequestId::Null, McpError::origin_denied(decision.reason));
    }

    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => return error_response(RequestId::Null, McpError::invalid_json(err.to_string())),
    };

    if let Err(err) = reject_batch(&value) {
        return error_response(RequestId::Null, err);
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => return error_response(RequestId::Null, McpError::invalid_request(err.to_string())),
    };

    if let Err(err) = validate_jsonrpc_request(&request) {
        return error_response(request.id.clone().unwrap_or(RequestId::Null), err);
    }

    let session_header = headers.get(hdr::MCP_SESSION_ID).and_then(|v| v.to_str().ok());
    let is_initialize = request.method == "initialize";

    let session = if is_initialize {
        create_session(&state, None, origin.map(str::to_string))
    } else {
        match require_session(&state, session_header) {
            Ok(session) => session,
            Err(err) => return error_response(request.id.clone().unwrap_or(RequestId::Null), err),
        }
    };

    let now = state.clock.now();

    if request.is_notification() {
        let _ = tokio::time::timeout(state.config.request_timeout, state.dispatcher.dispatch(&request, now)).await;
        return (StatusCode::ACCEPTED, response_headers(&state, &session.id)).into_response();
    }

    let id = request.id.clone().unwrap_or(RequestId::Null);
    let response = match tokio::time::timeout(state.config.request_timeout, state.dispatcher.dispatch(&request, now)).await {
        Ok(response) => response,
        Err(_) => JsonRpcResponse::error(id, &McpError::internal("engine dispatch timed out", now.to_rfc3339())),
    };

    (StatusCode::OK, response_headers(&state, &session.id), Json(response)).into_response()
}
