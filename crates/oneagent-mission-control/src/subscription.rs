//! Subscription Manager: per-connection subscribed channel
//! set, plus fan-out publish.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use oneagent_mcp_types::McpError;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::channel::{ChannelContext, ChannelRegistry};

/// Opaque per-connection identifier (one per live WS socket).
pub type ConnectionId = String;

/// Channel through which a connection's outbound frames are queued for the
/// transport's writer task to drain.
pub type OutboundSender = UnboundedSender<Value>;

/// A (connection, channel) pair.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Channel name.
    pub channel: String,
    /// When the subscription was accepted.
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Default)]
struct ConnectionState {
    sender: Option<OutboundSender>,
    channels: HashSet<String>,
}

/// Owns per-connection subscription sets and drives fan-out publish.
pub struct SubscriptionManager {
    registry: Arc<ChannelRegistry>,
    connections: DashMap<ConnectionId, ConnectionState>,
}

impl SubscriptionManager {
    /// New manager dispatching subscribe/unsubscribe against `registry`.
    pub fn new(registry: Arc<ChannelRegistry>) -> Arc<Self> {
        Arc::new(Self { registry, connections: DashMap::new() })
    }

    /// Register a newly connected socket and its outbound frame sender.
    pub fn register_connection(&self, conn_id: ConnectionId, sender: OutboundSender) {
        self.connections.insert(conn_id, ConnectionState { sender: Some(sender), channels: HashSet::new() });
    }

    fn context_for(self: &Arc<Self>, conn_id: &ConnectionId) -> ChannelContext {
        let this = Arc::clone(self);
        ChannelContext {
            conn_id: conn_id.clone(),
            publish: Arc::new(move |channel, payload| this.publish(channel, payload)),
        }
    }

    /// Subscribe `conn_id` to `channel_name`. Adding an already-present
    /// channel is a no-op. Fails `unknown_channel` if
    /// the channel was never registered.
    pub fn subscribe(self: &Arc<Self>, conn_id: &ConnectionId, channel_name: &str, now: DateTime<Utc>) -> Result<(), McpError> {
        let channel = self.registry.get(channel_name).ok_or_else(|| McpError::unknown_channel(channel_name))?;

        let is_new = {
            let mut state = self.connections.entry(conn_id.clone()).or_default();
            state.channels.insert(channel_name.to_string())
        };
        if is_new {
            let ctx = self.context_for(conn_id);
            channel.on_subscribe(&ctx);
            let _ = now; // subscribed_at is tracked by callers that need Subscription records.
        }
        Ok(())
    }

    /// Unsubscribe `conn_id` from `channel_name`. Always acks, even if the
    /// connection was not subscribed.
    pub fn unsubscribe(self: &Arc<Self>, conn_id: &ConnectionId, channel_name: &str) {
        let was_subscribed = {
            match self.connections.get_mut(conn_id) {
                Some(mut state) => state.channels.remove(channel_name),
                None => false,
            }
        };
        if was_subscribed {
            if let Some(channel) = self.registry.get(channel_name) {
                let ctx = self.context_for(conn_id);
                channel.on_unsubscribe(&ctx);
            }
        }
    }

    /// Current channel set for a connection.
    pub fn subscriptions(&self, conn_id: &ConnectionId) -> HashSet<String> {
        self.connections.get(conn_id).map(|s| s.channels.clone()).unwrap_or_default()
    }

    /// Send `payload` to every connection currently subscribed to
    /// `channel_name`.
    pub fn publish(&self, channel_name: &str, payload: Value) {
        for entry in self.connections.iter() {
            let state = entry.value();
            if state.channels.contains(channel_name) {
                if let Some(sender) = &state.sender {
                    if sender.send(payload.clone()).is_err() {
                        tracing::debug!(conn_id = %entry.key(), channel = channel_name, "outbound channel closed, dropping publish");
                    }
                }
            }
        }
    }

    /// On connection close: invoke `disposeConnection` for every channel
    /// still subscribed, then drop the connection's state entirely. Removal
    /// on close is guaranteed, not best-effort.
    pub fn dispose_connection(self: &Arc<Self>, conn_id: &ConnectionId) {
        let channels: Vec<String> = self
            .connections
            .get(conn_id)
            .map(|s| s.channels.iter().cloned().collect())
            .unwrap_or_default();

        let ctx = self.context_for(conn_id);
        for channel_name in channels {
            if let Some(channel) = self.registry.get(&channel_name) {
                channel.dispose_connection(&ctx);
            }
        }
        self.connections.remove(conn_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{register_builtin_channels, PassiveChannel};
    use tokio::sync::mpsc;

    fn manager_with_channel(name: &str) -> Arc<SubscriptionManager> {
        let registry = ChannelRegistry::new();
        registry.register(Arc::new(PassiveChannel::new(name))).unwrap();
        SubscriptionManager::new(registry)
    }

    #[test]
    fn subscribe_to_unknown_channel_fails() {
        let manager = manager_with_channel("known");
        let (tx, _rx) = mpsc::unbounded_channel();
        manager.register_connection("c1".into(), tx);
        assert!(manager.subscribe(&"c1".into(), "unknown", Utc::now()).is_err());
    }

    #[test]
    fn subscribe_is_idempotent() {
        let manager = manager_with_channel("known");
        let (tx, _rx) = mpsc::unbounded_channel();
        manager.register_connection("c1".into(), tx);
        manager.subscribe(&"c1".into(), "known", Utc::now()).unwrap();
        manager.subscribe(&"c1".into(), "known", Utc::now()).unwrap();
        assert_eq!(manager.subscriptions(&"c1".into()).len(), 1);
    }

    #[test]
    fn publish_reaches_only_subscribed_connections() {
        let manager = manager_with_channel("known");
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        manager.register_connection("c1".into(), tx1);
        manager.register_connection("c2".into(), tx2);
        manager.subscribe(&"c1".into(), "known", Utc::now()).unwrap();

        manager.publish("known", serde_json::json!({"x": 1}));

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn dispose_connection_removes_all_subscriptions() {
        let manager = manager_with_channel("known");
        let (tx, _rx) = mpsc::unbounded_channel();
        manager.register_connection("c1".into(), tx);
        manager.subscribe(&"c1".into(), "known", Utc::now()).unwrap();

        manager.dispose_connection(&"c1".into());
        assert!(manager.subscriptions(&"c1".into()).is_empty());
    }

    #[test]
    fn builtin_channels_accept_subscriptions() {
        let registry = ChannelRegistry::new();
        register_builtin_channels(&registry).unwrap();
        let manager = SubscriptionManager::new(registry);
        let (tx, _rx) = mpsc::unbounded_channel();
        manager.register_connection("c1".into(), tx);
        assert!(manager.subscribe(&"c1".into(), "health_delta", Utc::now()).is_ok());
    }
}
