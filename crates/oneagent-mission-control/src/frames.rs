//! Outbound frame envelope and id generation.
//!
//! Every outbound Mission-Control frame carries `protocolVersion`, `type`,
//! `id`, `timestamp` (ISO), `unix`, and `server{name,version}`. The server
//! assigns `id` with a per-kind generator; times are drawn from a unified
//! time service.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use oneagent_mcp_core::Clock;
use serde::Serialize;
use serde_json::Value;

/// Mission-Control protocol version advertised on every frame.
pub const MISSION_CONTROL_PROTOCOL_VERSION: &str = "1.0";

/// `server{name,version}` block embedded in every outbound frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Per-kind monotonically increasing id generator.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: DashMap<String, AtomicU64>,
}

impl IdGenerator {
    /// New, empty generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for `kind`, formatted `"{kind}_{n}"` starting at 1.
    pub fn next(&self, kind: &str) -> String {
        let counter = self
            .counters
            .entry(kind.to_string())
            .or_insert_with(|| AtomicU64::new(0));
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{kind}_{n}")
    }
}

/// Builds outbound frames with the envelope every Mission-Control frame
/// must carry.
pub struct FrameBuilder {
    server_info: FrameServerInfo,
    ids: IdGenerator,
    clock: std::sync::Arc<dyn Clock>,
}

impl FrameBuilder {
    /// New builder reporting `server_info`, drawing times from `clock`.
    pub fn new(server_info: FrameServerInfo, clock: std::sync::Arc<dyn Clock>) -> Self {
        Self { server_info, ids: IdGenerator::new(), clock }
    }

    /// Build a frame of `kind` with `body` merged into the envelope.
    pub fn build(&self, kind: &str, mut body: Value) -> Value {
        let now = self.clock.now();
        let id = self.ids.next(kind);

        let envelope = body.as_object_mut().expect("frame body must be a JSON object");
        envelope.insert("protocolVersion".into(), Value::String(MISSION_CONTROL_PROTOCOL_VERSION.into()));
        envelope.insert("type".into(), Value::String(kind.to_string()));
        envelope.insert("id".into(), Value::String(id));
        envelope.insert("timestamp".into(), Value::String(now.to_rfc3339()));
        envelope.insert("unix".into(), serde_json::json!(now.timestamp()));
        envelope.insert(
            "server".into(),
            serde_json::to_value(&self.server_info).expect("FrameServerInfo always serializes"),
        );
        body
    }
}
