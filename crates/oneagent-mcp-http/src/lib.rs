//! HTTP MCP transport (C10): `POST /mcp` JSON-RPC dispatch, `GET /mcp`
//! SSE streaming with `Last-Event-ID` resume, `DELETE /mcp` session
//! termination, and the static `/health`/`/info`/`.well-known` descriptors.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

mod delete;
mod descriptors;
mod error;
mod get;
pub mod headers;
mod post;
mod router;
mod session;
mod state;

pub use router::router;
pub use state::{HttpConfig, HttpState, DEFAULT_STREAM_ID};
