use super::client_connection::McpConnection;
use crate::config::BackendConfig;
use crate::core::session::{BackendConnector, BoxFuture, ConnectPolicy, ConnectionManager, ToolBackend};
use std::sync::Arc;

/// Spawns a fresh stdio MCP session per connection attempt.
pub struct McpConnector {
    config: BackendConfig,
}

impl McpConnector {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

impl BackendConnector for McpConnector {
    fn connect(&self) -> BoxFuture<'_, anyhow::Result<Arc<dyn ToolBackend>>> {
        Box::pin(async move {
            let connection = McpConnection::connect_stdio(&self.config).await?;
            Ok(Arc::new(connection) as Arc<dyn ToolBackend>)
        })
    }
}

/// Connection manager for the configured MCP backend. Call
/// [`ConnectionManager::connect`] before use.
pub fn connection_manager(config: &BackendConfig) -> ConnectionManager {
    ConnectionManager::new(
        Arc::new(McpConnector::new(config.clone())),
        ConnectPolicy::from(config),
    )
}
