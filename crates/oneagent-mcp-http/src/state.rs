//! Shared state threaded through every `/mcp` handler.
//!
//! Composes the already-standalone `oneagent_mcp_core` components
//! (`SessionStore`, `EventLog`, `OriginValidator`) with the protocol
//! `Dispatcher`, rather than one coupled `Session{event_buffer}` struct —
//! this core keeps session bookkeeping and SSE event buffering as two
//! separately owned components.

use std::sync::Arc;
use std::time::Duration;

use oneagent_mcp_core::{Clock, EventLog, OriginValidator, SessionStore, SystemClock};
use oneagent_mcp_protocol::{Dispatcher, Engine};

/// Canonical single-stream identifier used for every session's SSE
/// connection. One session has at most one logical event stream; a
/// reconnect re-subscribes to the same stream id so `Last-Event-ID` resume
/// lookups keep working across TCP reconnects.
pub const DEFAULT_STREAM_ID: &str = "default";

/// Request-handling configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Path both MCP HTTP verbs are served on. Default `/mcp`.
    pub endpoint_path: String,
    /// Protocol version advertised in `X-MCP-Protocol-Version`.
    pub protocol_version: String,
    /// Session inactivity TTL.
    pub session_ttl: chrono::Duration,
    /// Per-session cap on retained SSE events.
    pub max_events_per_session: usize,
    /// SSE keep-alive comment cadence. Must fall in `[15s, 30s]` per the
    /// wire framing contract.
    pub heartbeat_interval: Duration,
    /// Deadline after which an engine dispatch gives up and the request
    /// fails with `internal_error`.
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/mcp".to_string(),
            protocol_version: oneagent_mcp_protocol::PROTOCOL_VERSION.to_string(),
            session_ttl: oneagent_mcp_core::DEFAULT_SESSION_TTL,
            max_events_per_session: oneagent_mcp_core::DEFAULT_MAX_EVENTS_PER_SESSION,
            heartbeat_interval: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the HTTP handlers need, shared behind `Arc` clones.
pub struct HttpState<E: Engine> {
    /// Validated-request dispatcher over the external engine.
    pub dispatcher: Arc<Dispatcher<E>>,
    /// Session-of-record for every `Mcp-Session-Id`.
    pub sessions: Arc<SessionStore>,
    /// Per-session SSE replay buffer.
    pub events: Arc<EventLog>,
    /// Origin/DNS-rebinding guard.
    pub origin: Arc<OriginValidator>,
    /// Static configuration.
    pub config: HttpConfig,
    /// Time source, injectable in tests.
    pub clock: Arc<dyn Clock>,
}

impl<E: Engine> Clone for HttpState<E> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            sessions: self.sessions.clone(),
            events: self.events.clone(),
            origin: self.origin.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<E: Engine> HttpState<E> {
    /// Build state with a real system clock and a fresh session store/event
    /// log sized from `config`.
    pub fn new(dispatcher: Arc<Dispatcher<E>>, origin: Arc<OriginValidator>, config: HttpConfig) -> Self {
        let max_events = config.max_events_per_session;
        Self {
            dispatcher,
            sessions: SessionStore::new(),
            events: EventLog::new(max_events),
            origin,
            config,
            clock: Arc::new(SystemClock),
        }
    }
}
