//! Binary-level wiring: configuration, observability, and the
//! HTTP + Mission-Control WS (or stdio) transports sharing one engine
//! and dispatcher, composing the already-standalone transport crates
//! into a runnable process.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod observability;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use oneagent_mcp_core::{OriginConfig, OriginValidator, SystemClock};
use oneagent_mcp_protocol::{Dispatcher, DispatcherConfig, Engine, ServerInfo};
use oneagent_mcp_stdio::serve_stdio;
use oneagent_mission_control::{
    register_builtin_channels, ChannelRegistry, FrameBuilder, FrameServerInfo, MissionControlState, MissionExecutor,
    SubscriptionManager,
};

pub use config::ServerConfig;
pub use engine::StubEngine;

fn server_info() -> ServerInfo {
    ServerInfo { name: env!("CARGO_PKG_NAME").to_string(), version: env!("CARGO_PKG_VERSION").to_string() }
}

fn dispatcher_config() -> DispatcherConfig {
    DispatcherConfig {
        server_info: server_info(),
        tool_sets_supported: false,
        resource_subscribe_supported: false,
        sampling_enabled: None,
        oauth2: None,
    }
}

/// Periodically reap expired sessions and age out stale SSE events.
/// Gated on `ONEAGENT_DISABLE_AUTO_MONITORING` so tests can drive cleanup
/// deterministically instead of racing a live scheduler.
fn spawn_reaper(sessions: Arc<oneagent_mcp_core::SessionStore>, events: Arc<oneagent_mcp_core::EventLog>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(oneagent_mcp_core::DEFAULT_REAP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let now = chrono::Utc::now();
            let reaped = sessions.cleanup_expired(now);
            let evicted = events.cleanup_older_than(chrono::Duration::hours(1), now);
            if reaped > 0 || evicted > 0 {
                tracing::info!(reaped, evicted, "periodic reap");
            }
        }
    });
}

/// Build the merged HTTP MCP + Mission-Control WS router over one shared
/// [`StubEngine`] instance.
pub fn app(config: &ServerConfig) -> Router {
    let engine = Arc::new(StubEngine);

    let dispatcher = Arc::new(Dispatcher::new(engine.clone(), dispatcher_config()));
    let origin = Arc::new(OriginValidator::new(OriginConfig::default()));
    let http_state = oneagent_mcp_http::HttpState::new(
        dispatcher,
        origin,
        oneagent_mcp_http::HttpConfig { endpoint_path: config.mcp_path.clone(), ..Default::default() },
    );
    if !config.disable_auto_monitoring {
        spawn_reaper(http_state.sessions.clone(), http_state.events.clone());
    }

    let channels = ChannelRegistry::new();
    register_builtin_channels(&channels).expect("builtin channel names are distinct");
    let subscriptions = SubscriptionManager::new(channels.clone());
    let missions = MissionExecutor::new(engine.clone() as Arc<dyn Engine>);
    let frames = Arc::new(FrameBuilder::new(
        FrameServerInfo { name: server_info().name, version: server_info().version },
        Arc::new(SystemClock),
    ));
    let mission_control_state = MissionControlState { channels, subscriptions, missions, frames };

    oneagent_mcp_http::router(http_state)
        .merge(oneagent_mission_control::router(&config.ws_path, mission_control_state))
}

/// Run the configured transport(s) until shutdown. `--stdio` serves
/// framed JSON-RPC over stdin/stdout and never binds HTTP; otherwise HTTP
/// MCP and Mission-Control WS share one `axum::serve` listener.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    if config.stdio {
        let engine = Arc::new(StubEngine);
        let dispatcher = Arc::new(Dispatcher::new(engine, dispatcher_config()));
        tracing::info!("serving MCP over stdio");
        serve_stdio(dispatcher).await?;
        return Ok(());
    }

    let bind_addr = config.bind_addr();
    let router = app(&config);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, mcp_path = %config.mcp_path, ws_path = %config.ws_path, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
