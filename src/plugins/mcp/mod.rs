//! MCP (Model Context Protocol) backend.
//!
//! Reaches the tool-providing server over a child-process stdio transport.

pub mod bridge;
mod client_connection;
mod connector;

pub use client_connection::McpConnection;
pub use connector::{McpConnector, connection_manager};
