mod backend;
mod content;
mod manager;

pub use backend::{BackendConnector, BoxFuture, ToolBackend};
pub use content::{ToolCallOutput, ToolContent, render_content_to_text};
pub use manager::{ConnectPolicy, ConnectionManager, ConnectionStatus};
