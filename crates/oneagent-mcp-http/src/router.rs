//! Wires the POST/GET/DELETE `/mcp` handlers and the static descriptors
//! into one `axum::Router`, matching the route table in SPEC_FULL.md §6.1.

use axum::routing::{delete, get, post};
use axum::Router;
use oneagent_mcp_protocol::Engine;

use crate::delete::mcp_delete;
use crate::descriptors::{agent_card, health, info};
use crate::get::mcp_get;
use crate::post::mcp_post;
use crate::state::HttpState;

/// Build the HTTP MCP router. `state.config.endpoint_path` (default
/// `/mcp`) serves POST/GET/DELETE; the descriptor routes are fixed paths
/// regardless of `endpoint_path`.
pub fn router<E: Engine + 'static>(state: HttpState<E>) -> Router {
    let endpoint = state.config.endpoint_path.clone();
    Router::new()
        .route(&endpoint, post(mcp_post::<E>).get(mcp_get::<E>).delete(mcp_delete::<E>))
        .route("/health", get(health::<E>))
        .route("/info", get(info::<E>))
        .route("/.well-known/agent-card.json", get(agent_card::<E>))
        .route("/.well-known/agent.json", get(agent_card::<E>))
        .with_state(state)
}
