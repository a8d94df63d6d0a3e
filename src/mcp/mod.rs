//! MCP layer: tool adapter, JSON-RPC protocol, and the two transports

pub mod http;
pub mod protocol;
pub mod server;
pub mod stdio;
pub mod tool;

pub use server::McpServer;
pub use tool::{ClassifyTool, TOOL_NAME};
