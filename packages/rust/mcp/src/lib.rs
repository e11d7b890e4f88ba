//! Tool server exposing the Deploy API to AI assistants.
//!
//! [`tools::ToolRouter`] maps tool calls onto [`docbridge_client::DeployClient`]
//! and the enrichment pipeline; [`server::McpServer`] speaks newline-delimited
//! JSON-RPC over stdio.

pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{JsonRpcRequest, JsonRpcResponse, ToolContent, ToolDefinition, ToolResult};
pub use server::{McpServer, SERVER_NAME, serve_stdio};
pub use tools::{DEPLOYMENT_ENV, ORG_ENV, PORTAL_ENV, Tool, ToolRouter};
