//! Wire types and canonical error taxonomy shared by every OneAgent MCP
//! transport crate (HTTP, stdio, Mission-Control WS).
//!
//! This crate has no async runtime dependency and no I/O: it is pure data
//! plus the canonical error taxonomy, so every transport and the
//! dispatcher can share one `McpError` → JSON-RPC/HTTP/WS mapping.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]
#![deny(unsafe_code)]

mod error;
mod jsonrpc;

pub use error::{ErrorCode, McpError};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JsonRpcVersion, RequestId, JSONRPC_VERSION};
