//! Process configuration: CLI flags layered over the environment
//! variables named in the wire contract's §6.5. Explicit input always
//! wins over a default, and an explicit CLI flag wins over its
//! environment fallback (`clap`'s `env` attribute).

use clap::Parser;

/// Default HTTP bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default HTTP bind port.
pub const DEFAULT_PORT: u16 = 8787;
/// Default `tracing` env-filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default `/mcp` endpoint path.
pub const DEFAULT_MCP_PATH: &str = "/mcp";
/// Default Mission-Control WS path.
pub const DEFAULT_WS_PATH: &str = "/ws/mission-control";

/// MCP + Mission-Control transport core.
#[derive(Debug, Clone, Parser)]
#[command(name = "oneagent-mcp-server", version, about = "MCP + Mission-Control transport core")]
pub struct ServerConfig {
    /// HTTP bind host.
    #[arg(long, env = "ONEAGENT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// HTTP bind port.
    #[arg(long, env = "ONEAGENT_MCP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// `tracing-subscriber` `EnvFilter` directive, e.g. `info` or
    /// `oneagent_mcp_http=debug,info`.
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Disables background timers (session reap, event-log cleanup) so
    /// tests can drive time deterministically instead of racing a
    /// live scheduler.
    #[arg(long, env = "ONEAGENT_DISABLE_AUTO_MONITORING")]
    pub disable_auto_monitoring: bool,

    /// Path serving `POST`/`GET`/`DELETE` MCP.
    #[arg(long, default_value = DEFAULT_MCP_PATH)]
    pub mcp_path: String,

    /// Path serving the Mission-Control WS upgrade.
    #[arg(long, default_value = DEFAULT_WS_PATH)]
    pub ws_path: String,

    /// Serve stdio MCP instead of binding HTTP. Mission-Control WS is
    /// HTTP-only and is not started in this mode.
    #[arg(long)]
    pub stdio: bool,
}

impl ServerConfig {
    /// `{host}:{port}` for `tokio::net::TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let config = ServerConfig::parse_from(["oneagent-mcp-server"]);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.mcp_path, DEFAULT_MCP_PATH);
        assert_eq!(config.ws_path, DEFAULT_WS_PATH);
        assert!(!config.stdio);
    }

    #[test]
    fn cli_flag_overrides_default() {
        let config = ServerConfig::parse_from(["oneagent-mcp-server", "--port", "9000", "--stdio"]);
        assert_eq!(config.port, 9000);
        assert!(config.stdio);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = ServerConfig::parse_from(["oneagent-mcp-server", "--host", "0.0.0.0", "--port", "4000"]);
        assert_eq!(config.bind_addr(), "0.0.0.0:4000");
    }
}
