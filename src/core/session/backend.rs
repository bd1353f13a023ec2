use super::content::ToolCallOutput;
use crate::core::planner::ToolDescriptor;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request/response contract of the tool-providing backend.
pub trait ToolBackend: Send + Sync {
    /// Current tool catalog.
    fn list_tools(&self) -> BoxFuture<'_, anyhow::Result<Vec<ToolDescriptor>>>;

    /// Invoke one tool. `Ok` with `is_error = true` and `Err` are both
    /// treated as a failed step by callers.
    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, anyhow::Result<ToolCallOutput>>;

    /// Release the session.
    fn shutdown(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }
}

/// Starts a fresh backend session. Called once per connection attempt.
pub trait BackendConnector: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, anyhow::Result<Arc<dyn ToolBackend>>>;
}
