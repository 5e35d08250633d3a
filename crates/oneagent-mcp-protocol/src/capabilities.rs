//! Capability negotiation types exchanged during `initialize`.
//!
//! Narrowed from the full upstream MCP capability surface down to the
//! specific shape this core requires: `tools{listChanged, toolSets?}`,
//! `resources{subscribe, listChanged, templates?}`, `prompts{listChanged}`,
//! `sampling{enabled?}`, `logging{}`, optional `auth.oauth2`.

use serde::{Deserialize, Serialize};

/// Server capabilities returned from `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolsCapabilities,
    /// Resource-related capabilities.
    pub resources: ResourcesCapabilities,
    /// Prompt-related capabilities.
    pub prompts: PromptsCapabilities,
    /// Sampling passthrough capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingCapabilities>,
    /// Always present, currently featureless.
    pub logging: LoggingCapabilities,
    /// Present only when OAuth is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthCapabilities>,
}

/// `tools{listChanged, toolSets?}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsCapabilities {
    /// Whether the server will emit `toolsChanged` notifications.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
    /// Whether the server groups tools into named sets (`tools/sets`).
    #[serde(rename = "toolSets", skip_serializing_if = "Option::is_none")]
    pub tool_sets: Option<bool>,
}

/// `resources{subscribe, listChanged, templates?}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResourcesCapabilities {
    /// Whether resource subscription is supported.
    pub subscribe: bool,
    /// Whether the server will emit `resourcesChanged` notifications.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
    /// Whether templated resource URIs (`resources/templates`) are offered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<bool>,
}

/// `prompts{listChanged}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsCapabilities {
    /// Whether the server will emit `promptsChanged` notifications.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// `sampling{enabled?}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SamplingCapabilities {
    /// Whether `sampling/createMessage` is wired to a real engine sampler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Always-present, currently featureless logging capability marker.
/// Empty-braces, not a unit struct: `serde_json` serializes a unit
/// struct as `null`, but the wire shape is `logging{}` (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingCapabilities {}

/// `auth{oauth2?}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthCapabilities {
    /// OAuth2 endpoint summary, present when OAuth is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth2: Option<OAuth2Capability>,
}

/// OAuth2 endpoint summary, published only when OAuth is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Capability {
    /// Authorization endpoint.
    pub authorization_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Supported scopes.
    pub scopes: Vec<String>,
}

/// Server identity reported in `initialize` and every outbound WS frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}
