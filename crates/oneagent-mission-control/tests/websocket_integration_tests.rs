//! Mission-Control WS Transport integration tests — real socket,
//! real server, real `tokio-tungstenite` client. No mocks of the
//! transport itself; only the `Engine` behind `mission_start` is a test
//! double.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use oneagent_mcp_core::SystemClock;
use oneagent_mcp_protocol::{Engine, EngineRequest, EngineResponse, Prompt, Resource, Tool};
use oneagent_mission_control::{
    register_builtin_channels, router, ChannelRegistry, FrameBuilder, FrameServerInfo, MissionControlState,
    MissionExecutor, SubscriptionManager,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

struct EchoingEngine;

#[async_trait]
impl Engine for EchoingEngine {
    async fn get_available_tools(&self) -> Vec<Tool> {
        Vec::new()
    }
    async fn get_available_resources(&self) -> Vec<Resource> {
        Vec::new()
    }
    async fn get_available_prompts(&self) -> Vec<Prompt> {
        Vec::new()
    }
    async fn process_request(&self, request: EngineRequest) -> EngineResponse {
        tokio::time::sleep(Duration::from_millis(50)).await;
        EngineResponse::ok(request.params)
    }
}

struct NeverFinishingEngine;

#[async_trait]
impl Engine for NeverFinishingEngine {
    async fn get_available_tools(&self) -> Vec<Tool> {
        Vec::new()
    }
    async fn get_available_resources(&self) -> Vec<Resource> {
        Vec::new()
    }
    async fn get_available_prompts(&self) -> Vec<Prompt> {
        Vec::new()
    }
    async fn process_request(&self, request: EngineRequest) -> EngineResponse {
        tokio::time::sleep(Duration::from_secs(60)).await;
        EngineResponse::ok(request.params)
    }
}

async fn spawn_server(engine: Arc<dyn Engine>) -> String {
    let channels = ChannelRegistry::new();
    register_builtin_channels(&channels).unwrap();
    let subscriptions = SubscriptionManager::new(channels.clone());
    let missions = MissionExecutor::new(engine);
    let frames = Arc::new(FrameBuilder::new(
        FrameServerInfo { name: "oneagent-mcp".into(), version: "0.1.0".into() },
        Arc::new(SystemClock),
    ));
    let state = MissionControlState { channels, subscriptions, missions, frames };
    let app = router("/ws/mission-control", state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}/ws/mission-control")
}

async fn recv_json(read: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin)) -> Value {
    let message = timeout(Duration::from_secs(5), read.next()).await.expect("timed out").expect("stream ended").expect("ws error");
    match message {
        Message::Text(text) => serde_json::from_str(&text).expect("invalid JSON frame"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn subscribe_to_unknown_channel_is_rejected_without_invoking_on_subscribe() {
    let url = spawn_server(Arc::new(EchoingEngine)).await;
    let (ws, _) = connect_async(&url).await.expect("connect failed");
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text(json!({"type": "subscribe", "channels": ["does_not_exist"]}).to_string().into()))
        .await
        .unwrap();

    let response = recv_json(&mut read).await;
    assert_eq!(response["type"], "subscription_error");
    assert_eq!(response["error"]["code"], "unknown_channel");
}

#[tokio::test]
async fn mission_cancel_stops_execution_and_emits_exactly_one_terminal_frame() {
    let url = spawn_server(Arc::new(NeverFinishingEngine)).await;
    let (ws, _) = connect_async(&url).await.expect("connect failed");
    let (mut write, mut read) = ws.split();

    write
        .send(Message::Text(json!({"type": "mission_start", "command": "/mission build index"}).to_string().into()))
        .await
        .unwrap();

    let accepted = recv_json(&mut read).await;
    assert_eq!(accepted["type"], "mission_update");
    assert_eq!(accepted["status"], "accepted");
    let mission_id = accepted["missionId"].as_str().unwrap().to_string();

    let running = recv_json(&mut read).await;
    assert_eq!(running["type"], "mission_update");
    assert_eq!(running["status"], "running");

    write
        .send(Message::Text(json!({"type": "mission_cancel", "missionId": mission_id}).to_string().into()))
        .await
        .unwrap();

    let canceled = recv_json(&mut read).await;
    assert_eq!(canceled["type"], "mission_canceled");
    assert_eq!(canceled["missionId"], mission_id);

    // No further frame for this mission arrives; only heartbeats could
    // follow, and those are 30s away, well past this test's patience.
    let late = timeout(Duration::from_millis(200), read.next()).await;
    assert!(late.is_err(), "expected no further frame after the terminal mission_canceled");
}

#[tokio::test]
async fn whoami_and_ping_roundtrip() {
    let url = spawn_server(Arc::new(EchoingEngine)).await;
    let (ws, _) = connect_async(&url).await.expect("connect failed");
    let (mut write, mut read) = ws.split();

    write.send(Message::Text(json!({"type": "ping"}).to_string().into())).await.unwrap();
    let pong = recv_json(&mut read).await;
    assert_eq!(pong["type"], "pong");

    write.send(Message::Text(json!({"type": "whoami"}).to_string().into())).await.unwrap();
    let whoami = recv_json(&mut read).await;
    assert_eq!(whoami["type"], "whoami");
    assert!(whoami["connectionId"].as_str().unwrap().starts_with("conn_"));
}

#[tokio::test]
async fn malformed_json_produces_protocol_error_without_closing() {
    let url = spawn_server(Arc::new(EchoingEngine)).await;
    let (ws, _) = connect_async(&url).await.expect("connect failed");
    let (mut write, mut read) = ws.split();

    write.send(Message::Text("{not json".into())).await.unwrap();
    let error = recv_json(&mut read).await;
    assert_eq!(error["type"], "protocol_error");
    assert_eq!(error["error"]["code"], "invalid_json");

    // connection still alive: ping still works after the bad frame.
    write.send(Message::Text(json!({"type": "ping"}).to_string().into())).await.unwrap();
    let pong = recv_json(&mut read).await;
    assert_eq!(pong["type"], "pong");
}
