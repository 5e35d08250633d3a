//! Structured logging init via `tracing-subscriber`.
//!
//! No OpenTelemetry export and no security-audit/performance-monitor
//! globals: metrics exporter format and persistent audit logging are
//! out of scope for this core — just a level-filtered `fmt` layer,
//! installed once at startup.

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Failure initializing the global `tracing` subscriber.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// `log_level` was not a valid `EnvFilter` directive.
    #[error("invalid log level filter: {0}")]
    InvalidFilter(String),
    /// A global subscriber was already installed (e.g. by a test harness).
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global `tracing` subscriber. `RUST_LOG`, if set, takes
/// precedence over `log_level`.
///
/// `stdio_transport` must be `true` when the process serves MCP over
/// stdio (`--stdio`): stdout then carries nothing but framed protocol
/// bytes (spec §4.11/§6.2), so every log line is routed to stderr
/// instead of the default stdout writer.
pub fn init(log_level: &str, stdio_transport: bool) -> Result<(), ObservabilityError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|err| ObservabilityError::InvalidFilter(err.to_string()))?;

    let writer = if stdio_transport {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(writer))
        .try_init()
        .map_err(|err| ObservabilityError::AlreadyInitialized(err.to_string()))
}
