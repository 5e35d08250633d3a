//! `DELETE /mcp`: terminate a session. Idempotent from the client's
//! perspective — deleting twice, or deleting an id that was never live,
//! both resolve through the same "not found" path as a live delete.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use oneagent_mcp_protocol::Engine;

use crate::headers as hdr;
use crate::state::HttpState;

/// Requires `Mcp-Session-Id`. `200` if a live session was found and
/// terminated, `404` if the header was absent or did not resolve to a
/// live session.
pub async fn mcp_delete<E: Engine>(State(state): State<HttpState<E>>, headers: HeaderMap) -> Response {
    let Some(session_id) = headers.get(hdr::MCP_SESSION_ID).and_then(|v| v.to_str().ok()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let now = state.clock.now();
    match state.sessions.get(session_id, now) {
        Ok(_) => {
            state.sessions.delete(session_id);
            StatusCode::OK.into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
