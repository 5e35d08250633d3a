//! Stdio MCP transport (C11): Content-Length framed JSON-RPC over
//! stdin/stdout. stdout carries only protocol frames; every diagnostic
//! goes through `tracing`, matching the wire contract's "stdout MUST NOT
//! carry any non-protocol text".
//!
//! Grounded in the decision-gate MCP server's `serve_stdio`/`read_framed`/
//! `write_framed` functions, translated from synchronous `std::io` to
//! `tokio::io` so this transport can run alongside the HTTP and
//! Mission-Control WS transports in one process.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

mod framing;
mod serve;

pub use framing::{read_frame, write_frame, FramingError};
pub use serve::{serve, DEFAULT_MAX_BODY_BYTES};

use std::sync::Arc;

use oneagent_mcp_protocol::{Dispatcher, Engine};

/// Serve one dispatcher session over the current process's stdin/stdout,
/// using [`DEFAULT_MAX_BODY_BYTES`]. Runs until stdin closes.
pub async fn serve_stdio<E: Engine>(dispatcher: Arc<Dispatcher<E>>) -> std::io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve::serve(dispatcher, stdin, stdout, DEFAULT_MAX_BODY_BYTES).await
}
