//! The `Engine` contract: the external collaborator that owns
//! tool/resource/prompt business logic. The transport core only ever calls
//! through this trait — the engine's internals are explicitly out of scope.
//!
//! A handler-trait style (`#[async_trait]` traits over `Arc<dyn Trait>`),
//! generalized from many small per-operation traits into one coarse
//! `Engine` trait covering the whole flat operation list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// A tool the engine can invoke via `tools/call`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tool {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema describing accepted arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A resource the engine can read via `resources/read`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Resource {
    /// Resource URI.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// Optional MIME type hint.
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A templated resource URI pattern (`resources/templates`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResourceTemplate {
    /// URI template, e.g. `memory://{id}`.
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    /// Human-readable name.
    pub name: String,
    /// Free-form annotations (ownership, stability, etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
}

/// A prompt template the engine can expand via `prompts/get`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Prompt {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// One generic request handed to the engine by the dispatcher, matching
/// `processRequest({id, type, method, params, timestamp})`.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Correlation id, usually the JSON-RPC request id rendered as a string.
    pub id: String,
    /// Coarse request kind (`"tool_call"`, `"resource_read"`, `"prompt_get"`,
    /// `"sampling"`, ...).
    pub kind: String,
    /// The MCP method that produced this request.
    pub method: String,
    /// Method parameters, already shape-validated by the dispatcher.
    pub params: Value,
    /// When the request was accepted.
    pub timestamp: DateTime<Utc>,
}

/// Engine-reported failure detail.
#[derive(Debug, Clone)]
pub struct EngineErrorDetail {
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    pub details: Option<Value>,
}

/// Result of `processRequest`.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    /// Whether the engine considers the request successful.
    pub success: bool,
    /// Result payload, present iff `success`.
    pub data: Option<Value>,
    /// Failure detail, present iff `!success`.
    pub error: Option<EngineErrorDetail>,
    /// Optional self-reported confidence/quality score.
    pub quality_score: Option<f64>,
}

impl EngineResponse {
    /// Build a successful response.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            quality_score: None,
        }
    }

    /// Build a failed response.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(EngineErrorDetail { message: message.into(), details: None }),
            quality_score: None,
        }
    }
}

/// Events the engine can notify the dispatcher of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    /// The tool catalog changed.
    ToolsChanged,
    /// The resource catalog changed.
    ResourcesChanged,
    /// The prompt catalog changed.
    PromptsChanged,
}

/// A subscriber notified when an [`EngineEvent`] fires.
pub type EngineEventHandler = Arc<dyn Fn(EngineEvent) + Send + Sync>;

/// The contract the MCP Dispatcher and Mission Executor invoke against.
/// Implementations own tool/resource/prompt business logic, constitutional
/// validation, memory backends, and anything else out of scope for this
/// transport core.
#[async_trait]
pub trait Engine: Send + Sync {
    /// List tools available for `tools/list`.
    async fn get_available_tools(&self) -> Vec<Tool>;

    /// List resources available for `resources/list`.
    async fn get_available_resources(&self) -> Vec<Resource>;

    /// List prompts available for `prompts/list`.
    async fn get_available_prompts(&self) -> Vec<Prompt>;

    /// List templated resource URIs for `resources/templates`.
    async fn get_resource_templates(&self) -> Vec<ResourceTemplate> {
        Vec::new()
    }

    /// Group tool names into logical bundles for `tools/sets`. Default
    /// implementation reports no grouping.
    async fn get_tool_sets(&self) -> Vec<(String, Vec<String>)> {
        Vec::new()
    }

    /// Process one dispatched request and produce a result or error.
    async fn process_request(&self, request: EngineRequest) -> EngineResponse;

    /// Register a handler invoked when catalogs change. Default
    /// implementation drops the handler (an engine with static catalogs
    /// need not wire this up).
    ///
    /// Nothing in this core calls `on` yet: no transport forwards a fired
    /// [`EngineEvent`] into a `listChanged` notification frame on the
    /// Channel Registry. An engine that registers a handler here still
    /// needs that push path built before `listChanged` can be advertised
    /// `true` for the corresponding capability (see `Dispatcher::capabilities`).
    fn on(&self, _event: EngineEvent, _handler: EngineEventHandler) {}

    /// Called once at transport startup, naming the transport kind
    /// (`"http"`, `"stdio"`, `"ws"`) bringing the engine online.
    async fn initialize(&self, _transport: &str) {}

    /// Called once at shutdown to release engine-owned resources.
    async fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine;

    #[async_trait]
    impl Engine for EchoEngine {
        async fn get_available_tools(&self) -> Vec<Tool> {
            vec![Tool {
                name: "echo".into(),
                description: "echoes input".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }]
        }

        async fn get_available_resources(&self) -> Vec<Resource> {
            Vec::new()
        }

        async fn get_available_prompts(&self) -> Vec<Prompt> {
            Vec::new()
        }

        async fn process_request(&self, request: EngineRequest) -> EngineResponse {
            EngineResponse::ok(request.params)
        }
    }

    #[tokio::test]
    async fn default_templates_and_tool_sets_are_empty() {
        let engine = EchoEngine;
        assert!(engine.get_resource_templates().await.is_empty());
        assert!(engine.get_tool_sets().await.is_empty());
    }

    #[tokio::test]
    async fn process_request_echoes_params() {
        let engine = EchoEngine;
        let response = engine
            .process_request(EngineRequest {
                id: "1".into(),
                kind: "tool_call".into(),
                method: "tools/call".into(),
                params: serde_json::json!({"x": 1}),
                timestamp: Utc::now(),
            })
            .await;
        assert!(response.success);
        assert_eq!(response.data, Some(serde_json::json!({"x": 1})));
    }
}
