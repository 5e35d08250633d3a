//! Session lookup/creation shared by the POST, GET, and DELETE handlers.

use oneagent_mcp_core::{generate_session_id, Session, SessionPatch};
use oneagent_mcp_protocol::Engine;
use oneagent_mcp_types::McpError;

use crate::state::HttpState;

/// Create a brand-new `Active` session for an `initialize` request.
pub fn create_session<E: Engine>(
    state: &HttpState<E>,
    client_id: Option<String>,
    origin: Option<String>,
) -> Session {
    let now = state.clock.now();
    let session = Session::new(generate_session_id(), client_id, origin, now, state.config.session_ttl);
    state
        .sessions
        .create(session.clone())
        .expect("freshly generated session id collided");
    session
}

/// Resolve `Mcp-Session-Id` to a live session for a non-`initialize`
/// request, touching `last_activity` on success. Fails `SessionNotFound`
/// if the header is absent, unknown, expired, or terminated.
pub fn require_session<E: Engine>(state: &HttpState<E>, session_id: Option<&str>) -> Result<Session, McpError> {
    let id = session_id.ok_or_else(|| McpError::session_not_found("<missing Mcp-Session-Id>"))?;
    let now = state.clock.now();
    let session = state.sessions.get(id, now)?;
    state.sessions.update(
        id,
        SessionPatch {
            last_activity: Some(now),
            ..Default::default()
        },
    )?;
    Ok(session)
}
