//! The default [`Engine`] this binary links when no richer engine is
//! wired in. Tool/resource/prompt business logic is explicitly out of
//! scope for this core; `StubEngine` exists only so the transports have
//! something to dispatch to, and echoes back whatever params it was
//! given.

use async_trait::async_trait;
use oneagent_mcp_protocol::{Engine, EngineRequest, EngineResponse, Prompt, Resource, Tool};

/// Engine with a single `echo` tool and empty resource/prompt catalogs.
#[derive(Debug, Default)]
pub struct StubEngine;

#[async_trait]
impl Engine for StubEngine {
    async fn get_available_tools(&self) -> Vec<Tool> {
        vec![Tool {
            name: "echo".to_string(),
            description: "returns its input arguments unchanged".to_string(),
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
