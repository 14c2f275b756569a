//! JSON-RPC/MCP stdio server exposing the `deepResearch` tool: one tool
//! call in, one markdown document out.

pub mod error;
pub mod protocol;
pub mod server;

pub use error::{JsonRpcError, Result, RpcError};
pub use server::{McpServer, ServerConfig};
