//! The MCP method surface: capability negotiation, the `Engine` contract,
//! and the dispatcher mapping JSON-RPC methods to engine calls.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

mod capabilities;
mod dispatcher;
mod engine;

pub use capabilities::{
    AuthCapabilities, LoggingCapabilities, OAuth2Capability, PromptsCapabilities, ResourcesCapabilities,
    SamplingCapabilities, ServerCapabilities, ServerInfo, ToolsCapabilities,
};
pub use dispatcher::{Dispatcher, DispatcherConfig, PROTOCOL_VERSION};
pub use engine::{
    Engine, EngineErrorDetail, EngineEvent, EngineEventHandler, EngineRequest, EngineResponse, Prompt, Resource,
    ResourceTemplate, Tool,
};
