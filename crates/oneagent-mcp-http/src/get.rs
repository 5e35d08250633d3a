//! `GET /mcp`: open an SSE stream when `Accept: text/event-stream` is
//! present; otherwise `405`. Resumes via `Last-Event-ID` against the
//! shared [`oneagent_mcp_core::EventLog`].

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use oneagent_mcp_protocol::Engine;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::error::error_response;
use crate::headers as hdr;
use crate::session::require_session;
use crate::state::{HttpState, DEFAULT_STREAM_ID};
use oneagent_mcp_types::RequestId;

/// `GET /mcp`. Requires `Accept: text/event-stream` and a live
/// `Mcp-Session-Id`. Replays anything after `Last-Event-ID` on this
/// stream first (those events carry the lowest ids), then sends a fresh
/// `notifications/initialized` event, then keeps the connection open
/// with periodic heartbeats.
pub async fn mcp_get<E: Engine>(State(state): State<HttpState<E>>, headers: HeaderMap) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let decision = state.origin.validate(origin);
    if !decision.allowed {
        return error_response(RequestId::Null, oneagent_mcp_types::McpError::origin_denied(decision.reason));
    }

    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()).unwrap_or("");
    if !accept.contains("text/event-stream") {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let session_header = headers.get(hdr::MCP_SESSION_ID).and_then(|v| v.to_str().ok());
    let session = match require_session(&state, session_header) {
        Ok(session) => session,
        Err(err) => return error_response(RequestId::Null, err),
    };
    let last_event_id = headers.get(hdr::LAST_EVENT_ID).and_then(|v| v.to_str().ok()).map(str::to_string);

    let (tx, rx) = mpsc::unbounded_channel::<SseEvent>();
    let events = state.events.clone();
    let session_id = session.id.clone();
    let heartbeat_interval = state.config.heartbeat_interval;

    tokio::spawn(async move {
        // Replayed events carry lower ids than anything appended from
        // this point on; send them first so ids stay monotone and in
        // append order on the wire, per §5/§8.
        let replay: Vec<oneagent_mcp_core::Event> = match last_event_id {
            Some(ref id) => events.after(&session_id, DEFAULT_STREAM_ID, id),
            None => Vec::new(),
        };
        for event in replay {
            if tx.send(to_sse(&event)).is_err() {
                return;
            }
        }

        let init = events.append(
            &session_id,
            DEFAULT_STREAM_ID,
            "notifications/initialized",
            json!({}),
            chrono::Utc::now(),
        );
        if tx.send(to_sse(&init)).is_err() {
            return;
        }
        // The sender half stays open; the writer task below supplies
        // heartbeats on its own cadence. This task's job is only the
        // initial burst (resumed backlog, then the freshly appended
        // initialized event).
        drop(tx);
    });

    let heartbeat_stream = heartbeat(heartbeat_interval);
    let combined = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>).chain(heartbeat_stream);

    Sse::new(combined).keep_alive(KeepAlive::new().interval(heartbeat_interval)).into_response()
}

fn to_sse(event: &oneagent_mcp_core::Event) -> SseEvent {
    SseEvent::default()
        .id(event.id.clone())
        .event(event.event_type.clone())
        .data(event.payload.to_string())
}

/// An infinite stream of `:heartbeat` comment events, one per
/// `interval`. Keeps the SSE connection alive per §4.1's 15-30s
/// keep-alive cadence; `axum`'s own `KeepAlive` layer also emits
/// comment lines, so this is a belt-and-suspenders application-level
/// heartbeat matching the wire contract's literal `:heartbeat\n\n`.
fn heartbeat(interval: Duration) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            yield Ok(SseEvent::default().comment("heartbeat"));
        }
    }
}
