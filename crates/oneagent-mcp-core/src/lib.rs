//! Transport-agnostic core of the OneAgent MCP server: session lifecycle,
//! the SSE event log, origin validation, and message shape validators
//! shared by the HTTP, stdio, and Mission-Control WS transports.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

mod clock;
mod event_log;
mod origin;
mod session;
mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use event_log::{Event, EventLog, DEFAULT_MAX_EVENTS_PER_SESSION};
pub use origin::{OriginConfig, OriginDecision, OriginValidator, REPEAT_OFFENDER_ALERT_THRESHOLD};
pub use session::{
    generate_session_id, Session, SessionPatch, SessionState, SessionStore, DEFAULT_REAP_INTERVAL_SECS,
    DEFAULT_SESSION_TTL,
};
pub use validate::{parse_inbound, reject_batch, validate_jsonrpc_request, validate_outbound, InboundMessage};
