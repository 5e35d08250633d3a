//! Mission-Control WS Transport.
//!
//! A split-socket receive loop generalized from one fixed JSON-RPC
//! `connected`/response exchange into the full Mission-Control
//! inbound/outbound frame set, plus a heartbeat interval and
//! liveness-based close.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use oneagent_mcp_core::{parse_inbound, validate_outbound, InboundMessage};
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::channel::ChannelRegistry;
use crate::frames::FrameBuilder;
use crate::mission::MissionExecutor;
use crate::subscription::SubscriptionManager;

/// Heartbeat cadence.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// A connection is considered dead, and closed, after this many missed
/// heartbeat intervals with no inbound activity.
pub const MISSED_HEARTBEAT_CLOSE_FACTOR: u32 = 2;

/// Shared state for the Mission-Control WS router.
#[derive(Clone)]
pub struct MissionControlState {
    /// Named channel publishers.
    pub channels: Arc<ChannelRegistry>,
    /// Per-connection subscription bookkeeping and fan-out.
    pub subscriptions: Arc<SubscriptionManager>,
    /// Mission lifecycle owner.
    pub missions: Arc<MissionExecutor>,
    /// Outbound envelope builder.
    pub frames: Arc<FrameBuilder>,
}

/// Build a router serving the Mission-Control WS at `path`. Any other path
/// is simply not registered — axum's router already closes unmatched
/// requests with 404, closing the socket at the HTTP-upgrade layer for
/// any other path.
pub fn router(path: &str, state: MissionControlState) -> Router {
    Router::new().route(path, get(upgrade)).with_state(state)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<MissionControlState>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: MissionControlState) {
    let conn_id = format!("conn_{}", Uuid::new_v4().simple());
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<serde_json::Value>();

    state.subscriptions.register_connection(conn_id.clone(), outbound_tx.clone());
    tracing::info!(conn_id = %conn_id, "mission-control connection opened");

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            validate_outbound(&frame);
            if ws_sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick fires immediately; skip it
    let mut last_activity = tokio::time::Instant::now();
    let mut missed_heartbeats: u32 = 0;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if last_activity.elapsed() > HEARTBEAT_INTERVAL {
                    missed_heartbeats += 1;
                }
                if missed_heartbeats > MISSED_HEARTBEAT_CLOSE_FACTOR {
                    tracing::warn!(conn_id = %conn_id, "closing connection after missed heartbeats");
                    break;
                }
                let frame = state.frames.build("heartbeat", json!({}));
                let _ = outbound_tx.send(frame);
            }
            incoming = ws_receiver.next() => {
                let Some(incoming) = incoming else { break };
                match incoming {
                    Ok(Message::Text(text)) => {
                        last_activity = tokio::time::Instant::now();
                        missed_heartbeats = 0;
                        handle_inbound(&conn_id, &text, &state, &outbound_tx);
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                        last_activity = tokio::time::Instant::now();
                        missed_heartbeats = 0;
                    }
                    Ok(Message::Binary(_)) => {}
                    Err(err) => {
                        tracing::warn!(conn_id = %conn_id, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    state.subscriptions.dispose_connection(&conn_id);
    state.missions.cancel_all_for_connection(&conn_id);
    writer.abort();
    tracing::info!(conn_id = %conn_id, "mission-control connection closed");
}

fn handle_inbound(
    conn_id: &str,
    text: &str,
    state: &MissionControlState,
    outbound_tx: &mpsc::UnboundedSender<serde_json::Value>,
) {
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(text);
    let value = match parsed {
        Ok(value) => value,
        Err(_) => {
            let frame = state.frames.build(
                "protocol_error",
                json!({ "error": { "code": "invalid_json" } }),
            );
            let _ = outbound_tx.send(frame);
            return;
        }
    };

    let message = match parse_inbound(&value) {
        Ok(message) => message,
        Err(_) => {
            let frame = state.frames.build(
                "protocol_error",
                json!({ "error": { "code": "invalid_message" } }),
            );
            let _ = outbound_tx.send(frame);
            return;
        }
    };

    match message {
        InboundMessage::Ping => {
            let frame = state.frames.build("pong", json!({}));
            let _ = outbound_tx.send(frame);
        }
        InboundMessage::Whoami => {
            let frame = state.frames.build("whoami", json!({ "connectionId": conn_id }));
            let _ = outbound_tx.send(frame);
        }
        InboundMessage::Subscribe { channels } => {
            let now = Utc::now();
            for channel in channels {
                match state.subscriptions.subscribe(&conn_id.to_string(), &channel, now) {
                    Ok(()) => {
                        let frame = state.frames.build("subscription_ack", json!({ "channel": channel }));
                        let _ = outbound_tx.send(frame);
                    }
                    Err(err) => {
                        let frame = state.frames.build(
                            "subscription_error",
                            json!({ "channel": channel, "error": { "code": err.code.as_str() } }),
                        );
                        let _ = outbound_tx.send(frame);
                    }
                }
            }
        }
        InboundMessage::Unsubscribe { channels } => {
            for channel in channels {
                state.subscriptions.unsubscribe(&conn_id.to_string(), &channel);
                let frame = state.frames.build("subscription_ack", json!({ "channel": channel, "unsubscribed": true }));
                let _ = outbound_tx.send(frame);
            }
        }
        InboundMessage::MissionStart { command } => {
            let mission_id = state.missions.start(
                conn_id.to_string(),
                command,
                outbound_tx.clone(),
                state.frames.clone(),
            );
            let frame = state.frames.build("mission_update", json!({ "missionId": mission_id, "status": "accepted" }));
            let _ = outbound_tx.send(frame);
        }
        InboundMessage::MissionCancel { mission_id } => {
            if let Err(err) = state.missions.cancel(&conn_id.to_string(), &mission_id) {
                let frame = state.frames.build(
                    "protocol_error",
                    json!({ "error": { "code": err.code.as_str() }, "missionId": mission_id }),
                );
                let _ = outbound_tx.send(frame);
            }
        }
    }
}
