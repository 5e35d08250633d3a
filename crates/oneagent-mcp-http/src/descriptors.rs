//! Static JSON descriptors: `GET /health`, `GET /info`,
//! `GET /.well-known/agent-card.json`, `GET /.well-known/agent.json`.
//!
//! None of these touch session/event state; they report process-wide,
//! immutable-after-startup facts, matching the "process-wide singletons"
//! re-architecture note in SPEC_FULL.md §2 (ambient stack).

use axum::extract::State;
use axum::Json;
use oneagent_mcp_protocol::Engine;
use serde_json::{json, Value};

use crate::state::HttpState;

/// `GET /health`: liveness probe. Reports process uptime is intentionally
/// left out (this core has no clock epoch of its own) in favor of a
/// trivial `ok` marker plus the live session count.
pub async fn health<E: Engine>(State(state): State<HttpState<E>>) -> Json<Value> {
    let now = state.clock.now();
    Json(json!({
        "status": "ok",
        "activeSessions": state.sessions.list_active(now).len(),
    }))
}

/// `GET /info`: server identity and advertised protocol version.
pub async fn info<E: Engine>(State(state): State<HttpState<E>>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "protocolVersion": state.config.protocol_version,
        "transports": ["http", "stdio", "websocket"],
    }))
}

/// `GET /.well-known/agent-card.json` and `GET /.well-known/agent.json`:
/// identical minimal agent-card descriptors naming this server and where
/// its MCP endpoint lives.
pub async fn agent_card<E: Engine>(State(state): State<HttpState<E>>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "protocolVersion": state.config.protocol_version,
        "endpoint": state.config.endpoint_path,
    }))
}
