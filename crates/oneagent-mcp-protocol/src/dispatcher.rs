//! MCP Dispatcher: maps MCP methods to engine calls and shapes
//! JSON-RPC results/errors.
//!
//! A method-table dispatch generalized down to a flat method table
//! talking to the `Engine` trait instead of many typed request/response
//! pairs against in-process tool/resource/prompt registries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oneagent_mcp_types::{ErrorCode, JsonRpcRequest, JsonRpcResponse, McpError, RequestId};
use serde_json::{json, Value};

use crate::capabilities::{
    AuthCapabilities, LoggingCapabilities, OAuth2Capability, PromptsCapabilities, ResourcesCapabilities,
    SamplingCapabilities, ServerCapabilities, ServerInfo, ToolsCapabilities,
};
use crate::engine::{Engine, EngineRequest};

/// Protocol version this dispatcher advertises.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Static configuration a [`Dispatcher`] advertises during `initialize`.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Identity reported in `initialize` and every WS frame.
    pub server_info: ServerInfo,
    /// Whether tools are grouped into named sets.
    pub tool_sets_supported: bool,
    /// Whether resource subscription (`resources/subscribe`) is supported.
    pub resource_subscribe_supported: bool,
    /// Whether `sampling/createMessage` is backed by a real sampler.
    pub sampling_enabled: Option<bool>,
    /// OAuth2 endpoints, if configured.
    pub oauth2: Option<OAuth2Capability>,
}

impl DispatcherConfig {
    /// Capabilities payload for the `initialize` response.
    ///
    /// `listChanged` is advertised `false` on all three: nothing in this
    /// core currently registers an [`Engine::on`] handler and pushes the
    /// resulting notification frame through the Channel Registry (see
    /// `Engine::on`'s doc comment), so promising `listChanged: true` would
    /// be a capability no client could ever observe firing.
    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: ToolsCapabilities {
                list_changed: false,
                tool_sets: Some(self.tool_sets_supported),
            },
            resources: ResourcesCapabilities {
                subscribe: self.resource_subscribe_supported,
                list_changed: false,
                templates: Some(true),
            },
            prompts: PromptsCapabilities { list_changed: false },
            sampling: self.sampling_enabled.map(|enabled| SamplingCapabilities { enabled: Some(enabled) }),
            logging: LoggingCapabilities {},
            auth: self.oauth2.clone().map(|oauth2| AuthCapabilities { oauth2: Some(oauth2) }),
        }
    }
}

/// Dispatches validated JSON-RPC requests to an [`Engine`] and shapes the
/// JSON-RPC result or error.
pub struct Dispatcher<E: Engine> {
    engine: Arc<E>,
    config: DispatcherConfig,
}

impl<E: Engine> Dispatcher<E> {
    /// New dispatcher over `engine`, advertising `config`.
    pub fn new(engine: Arc<E>, config: DispatcherConfig) -> Self {
        Self { engine, config }
    }

    /// Dispatch one already envelope-validated request. `now` backs the
    /// sanitized timestamp attached to internal errors.
    pub async fn dispatch(&self, request: &JsonRpcRequest, now: DateTime<Utc>) -> JsonRpcResponse {
        let id = request.id.clone().unwrap_or(RequestId::Null);
        let params = request.params.clone().unwrap_or(Value::Null);

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "notifications/initialized" => Ok(json!({})),
            "tools/list" => Ok(self.handle_tools_list().await),
            "tools/call" => self.handle_tools_call(params, &id, now).await,
            "resources/list" => Ok(self.handle_resources_list().await),
            "resources/read" => self.handle_resources_read(params, &id, now).await,
            "prompts/list" => Ok(self.handle_prompts_list().await),
            "prompts/get" => self.handle_prompts_get(params, &id, now).await,
            "tools/sets" => Ok(self.handle_tool_sets().await),
            "resources/templates" => Ok(self.handle_resource_templates().await),
            "sampling/createMessage" => self.handle_sampling(params, &id, now).await,
            "auth/status" => self.handle_auth_status(params, &id, now).await,
            other => Err(McpError::method_not_found(other)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => JsonRpcResponse::error(id, &err),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": self.config.server_info,
            "capabilities": self.config.capabilities(),
        })
    }

    async fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.engine.get_available_tools().await })
    }

    async fn handle_tools_call(&self, params: Value, id: &RequestId, now: DateTime<Utc>) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("tools/call requires 'name'"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let response = self
            .engine
            .process_request(EngineRequest {
                id: request_id_key(id),
                kind: "tool_call".into(),
                method: format!("tools/call:{name}"),
                params: json!({ "name": name, "arguments": arguments }),
                timestamp: now,
            })
            .await;

        match response.data.or(response.error.as_ref().map(|e| json!(e.message))) {
            Some(data) => Ok(json!({
                "toolResult": { "type": "json", "data": data, "success": response.success },
                "isError": !response.success,
            })),
            None => Err(McpError::internal("tool call produced no data", now.to_rfc3339())),
        }
    }

    async fn handle_resources_list(&self) -> Value {
        json!({ "resources": self.engine.get_available_resources().await })
    }

    async fn handle_resources_read(&self, params: Value, id: &RequestId, now: DateTime<Utc>) -> Result<Value, McpError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("resources/read requires 'uri'"))?;

        let response = self
            .engine
            .process_request(EngineRequest {
                id: request_id_key(id),
                kind: "resource_read".into(),
                method: "resources/read".into(),
                params: json!({ "uri": uri }),
                timestamp: now,
            })
            .await;

        if !response.success {
            return Err(engine_error_to_mcp(response.error, now));
        }
        let text = response.data.unwrap_or(Value::Null);
        Ok(json!({ "contents": [{ "uri": uri, "mimeType": "text/plain", "text": text }] }))
    }

    async fn handle_prompts_list(&self) -> Value {
        json!({ "prompts": self.engine.get_available_prompts().await })
    }

    async fn handle_prompts_get(&self, params: Value, id: &RequestId, now: DateTime<Utc>) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("prompts/get requires 'name'"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let response = self
            .engine
            .process_request(EngineRequest {
                id: request_id_key(id),
                kind: "prompt_get".into(),
                method: "prompts/get".into(),
                params: json!({ "name": name, "arguments": arguments }),
                timestamp: now,
            })
            .await;

        if !response.success {
            return Err(engine_error_to_mcp(response.error, now));
        }
        Ok(response.data.unwrap_or(Value::Null))
    }

    async fn handle_tool_sets(&self) -> Value {
        let sets = self.engine.get_tool_sets().await;
        json!({ "toolSets": sets.into_iter().map(|(name, tools)| json!({ "name": name, "tools": tools })).collect::<Vec<_>>() })
    }

    async fn handle_resource_templates(&self) -> Value {
        json!({ "resourceTemplates": self.engine.get_resource_templates().await })
    }

    async fn handle_sampling(&self, params: Value, id: &RequestId, now: DateTime<Utc>) -> Result<Value, McpError> {
        if params.get("messages").is_none() {
            return Err(McpError::invalid_params("sampling/createMessage requires 'messages'"));
        }
        let response = self
            .engine
            .process_request(EngineRequest {
                id: request_id_key(id),
                kind: "sampling".into(),
                method: "sampling/createMessage".into(),
                params,
                timestamp: now,
            })
            .await;

        if !response.success {
            return Err(engine_error_to_mcp(response.error, now));
        }
        Ok(response.data.unwrap_or(Value::Null))
    }

    async fn handle_auth_status(&self, params: Value, id: &RequestId, now: DateTime<Utc>) -> Result<Value, McpError> {
        let response = self
            .engine
            .process_request(EngineRequest {
                id: request_id_key(id),
                kind: "auth_status".into(),
                method: "auth/status".into(),
                params,
                timestamp: now,
            })
            .await;

        if !response.success {
            return Err(engine_error_to_mcp(response.error, now));
        }
        Ok(response.data.unwrap_or_else(|| json!({ "authenticated": false })))
    }
}

fn request_id_key(id: &RequestId) -> String {
    match id {
        RequestId::Str(s) => s.clone(),
        RequestId::Num(n) => n.to_string(),
        RequestId::Null => "null".to_string(),
    }
}

fn engine_error_to_mcp(detail: Option<crate::engine::EngineErrorDetail>, now: DateTime<Utc>) -> McpError {
    match detail {
        Some(detail) => McpError::internal(detail.message, now.to_rfc3339()),
        None => McpError::internal("engine reported failure with no detail", now.to_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, EngineEventHandler, EngineResponse, Prompt, Resource, ResourceTemplate, Tool};
    use async_trait::async_trait;

    struct StubEngine {
        fail_next: bool,
    }

    #[async_trait]
    impl Engine for StubEngine {
        async fn get_available_tools(&self) -> Vec<Tool> {
            vec![Tool { name: "echo".into(), description: "echo".into(), input_schema: json!({}) }]
        }
        async fn get_available_resources(&self) -> Vec<Resource> {
            vec![Resource { uri: "mem://1".into(), name: "note".into(), mime_type: None }]
        }
        async fn get_available_prompts(&self) -> Vec<Prompt> {
            vec![Prompt { name: "greet".into(), description: None, arguments: None }]
        }
        async fn get_resource_templates(&self) -> Vec<ResourceTemplate> {
            Vec::new()
        }
        async fn process_request(&self, request: EngineRequest) -> EngineResponse {
            if self.fail_next {
                return EngineResponse::failed("engine exploded");
            }
            EngineResponse::ok(request.params)
        }
        fn on(&self, _event: EngineEvent, _handler: EngineEventHandler) {}
    }

    fn config() -> DispatcherConfig {
        DispatcherConfig {
            server_info: ServerInfo { name: "oneagent-mcp".into(), version: "0.1.0".into() },
            tool_sets_supported: false,
            resource_subscribe_supported: false,
            sampling_enabled: Some(true),
            oauth2: None,
        }
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Default::default(),
            method: method.into(),
            params: Some(params),
            id: Some(RequestId::Num(1)),
        }
    }

    #[tokio::test]
    async fn initialize_reports_capabilities() {
        let dispatcher = Dispatcher::new(Arc::new(StubEngine { fail_next: false }), config());
        let response = dispatcher.dispatch(&request("initialize", json!({})), Utc::now()).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        // Nothing wires Engine::on's events to a push path yet, so
        // listChanged must not promise a notification no client will ever see.
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["capabilities"]["resources"]["listChanged"], false);
        assert_eq!(result["capabilities"]["prompts"]["listChanged"], false);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dispatcher = Dispatcher::new(Arc::new(StubEngine { fail_next: false }), config());
        let response = dispatcher.dispatch(&request("bogus/method", json!({})), Utc::now()).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn tools_call_missing_name_is_invalid_params() {
        let dispatcher = Dispatcher::new(Arc::new(StubEngine { fail_next: false }), config());
        let response = dispatcher.dispatch(&request("tools/call", json!({})), Utc::now()).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn tools_call_wraps_success_as_tool_result() {
        let dispatcher = Dispatcher::new(Arc::new(StubEngine { fail_next: false }), config());
        let response = dispatcher
            .dispatch(&request("tools/call", json!({"name": "echo", "arguments": {"x": 1}})), Utc::now())
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["toolResult"]["success"], true);
    }

    #[tokio::test]
    async fn resources_read_maps_engine_failure_to_internal_error() {
        let dispatcher = Dispatcher::new(Arc::new(StubEngine { fail_next: true }), config());
        let response = dispatcher.dispatch(&request("resources/read", json!({"uri": "mem://1"})), Utc::now()).await;
        assert_eq!(response.error.unwrap().code, -32603);
    }

    #[tokio::test]
    async fn sampling_requires_messages() {
        let dispatcher = Dispatcher::new(Arc::new(StubEngine { fail_next: false }), config());
        let response = dispatcher.dispatch(&request("sampling/createMessage", json!({})), Utc::now()).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
