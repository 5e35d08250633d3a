//! Header name constants for the `/mcp` wire contract.

/// Carries the session id on every non-`initialize` request and is
/// returned on `initialize`'s response.
pub const MCP_SESSION_ID: &str = "Mcp-Session-Id";

/// Protocol version advertised on every HTTP response.
pub const MCP_PROTOCOL_VERSION: &str = "X-MCP-Protocol-Version";

/// SSE resume cursor sent by a reconnecting client.
pub const LAST_EVENT_ID: &str = "Last-Event-ID";
