//! Channel Registry: named publishers with subscribe/
//! unsubscribe/dispose hooks.
//!
//! Generalized from a per-connection websocket send loop into a named,
//! multi-subscriber publish point instead of one fixed per-connection
//! stream.

use std::sync::Arc;

use dashmap::DashMap;
use oneagent_mcp_types::McpError;
use serde_json::Value;

use crate::subscription::ConnectionId;

/// Context handed to a [`Channel`]'s hooks: which connection triggered the
/// hook, and a way to publish on this channel without reaching back into
/// the registry.
#[derive(Clone)]
pub struct ChannelContext {
    /// The connection that triggered this hook.
    pub conn_id: ConnectionId,
    /// Publish `payload` on `channel_name` to every current subscriber.
    pub publish: Arc<dyn Fn(&str, Value) + Send + Sync>,
}

/// A named publisher on the Mission-Control WS.
///
/// Hook methods are synchronous by contract: implementations must not
/// block. Anything beyond trivial bookkeeping (an initial snapshot fetch,
/// a metrics scrape) must be spawned as its own task.
pub trait Channel: Send + Sync {
    /// Channel name, used in `subscribe`/`unsubscribe` requests.
    fn name(&self) -> &str;

    /// Called exactly once per new (connection, channel) pair, the moment a
    /// subscription is accepted.
    fn on_subscribe(&self, ctx: &ChannelContext);

    /// Called on an explicit `unsubscribe`. Default: no-op.
    fn on_unsubscribe(&self, _ctx: &ChannelContext) {}

    /// Called on connection close, once for every channel the connection
    /// was still subscribed to. Default: no-op.
    fn dispose_connection(&self, _ctx: &ChannelContext) {}
}

/// Stores channels by name.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<dyn Channel>>,
}

impl ChannelRegistry {
    /// Empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self { channels: DashMap::new() })
    }

    /// Insert a channel. Fails if the name is already registered.
    pub fn register(&self, channel: Arc<dyn Channel>) -> Result<(), McpError> {
        let name = channel.name().to_string();
        if self.channels.contains_key(&name) {
            return Err(McpError::new(
                oneagent_mcp_types::ErrorCode::InternalError,
                format!("channel already registered: {name}"),
            ));
        }
        self.channels.insert(name, channel);
        Ok(())
    }

    /// Fetch a channel by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Channel>> {
        self.channels.get(name).map(|entry| entry.value().clone())
    }

    /// All registered channel names.
    pub fn list(&self) -> Vec<String> {
        self.channels.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Built-in channel with no hook behavior beyond bookkeeping; periodic or
/// event-driven emission is owned by whatever task calls `publish` for it.
pub struct PassiveChannel {
    name: String,
}

impl PassiveChannel {
    /// New passive channel named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Channel for PassiveChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_subscribe(&self, _ctx: &ChannelContext) {}
}

/// Names of the built-in channels every Mission-Control deployment offers.
pub const BUILTIN_CHANNEL_NAMES: [&str; 3] = ["health_delta", "metrics_tick", "mission_stats"];

/// Register the three built-in channels (`health_delta`, `metrics_tick`,
/// `mission_stats`) as passive channels. Callers needing real hook
/// behavior should register their own `Channel` impls under these names
/// instead.
pub fn register_builtin_channels(registry: &ChannelRegistry) -> Result<(), McpError> {
    for name in BUILTIN_CHANNEL_NAMES {
        registry.register(Arc::new(PassiveChannel::new(name)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_get_then_list() {
        let registry = ChannelRegistry::new();
        registry.register(Arc::new(PassiveChannel::new("widgets"))).unwrap();
        assert!(registry.get("widgets").is_some());
        assert_eq!(registry.list(), vec!["widgets".to_string()]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = ChannelRegistry::new();
        registry.register(Arc::new(PassiveChannel::new("widgets"))).unwrap();
        assert!(registry.register(Arc::new(PassiveChannel::new("widgets"))).is_err());
    }

    #[test]
    fn builtin_channels_register_cleanly() {
        let registry = ChannelRegistry::new();
        register_builtin_channels(&registry).unwrap();
        let mut names = registry.list();
        names.sort();
        assert_eq!(names, vec!["health_delta", "metrics_tick", "mission_stats"]);
    }

    #[test]
    fn unknown_channel_get_returns_none() {
        let registry = ChannelRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
