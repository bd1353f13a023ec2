use super::bridge::{to_call_output, to_descriptor};
use crate::config::BackendConfig;
use crate::core::planner::ToolDescriptor;
use crate::core::session::{BoxFuture, ToolBackend, ToolCallOutput};
use anyhow::{Context, Result, anyhow};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{ServiceExt, model::CallToolRequestParams};
use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::RwLock;

type McpService = RunningService<RoleClient, ()>;

/// One stdio session with the tool-providing MCP server.
pub struct McpConnection {
    name: String,
    service: RwLock<Option<McpService>>,
    max_call_seconds: u64,
}

impl McpConnection {
    pub async fn connect_stdio(config: &BackendConfig) -> Result<Self> {
        let command = config.command.as_str();
        let service = ()
            .serve(TokioChildProcess::new(Command::new(command).configure(
                |cmd| {
                    cmd.args(&config.args);
                    cmd.envs(config.env.iter());
                    if let Some(cwd) = &config.cwd {
                        cmd.current_dir(shellexpand::tilde(cwd).into_owned());
                    }
                },
            ))?)
            .await
            .with_context(|| format!("failed to connect MCP server '{command}' over stdio"))?;

        tracing::info!(server = %config.name, command, "MCP session started");
        Ok(Self {
            name: config.name.clone(),
            service: RwLock::new(Some(service)),
            max_call_seconds: config.max_call_seconds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| anyhow!("MCP connection '{}' is not active", self.name))?;

        let tools = service
            .list_all_tools()
            .await
            .with_context(|| format!("failed to list tools for MCP server '{}'", self.name))?;
        Ok(tools.into_iter().map(to_descriptor).collect())
    }

    async fn invoke(&self, tool_name: &str, args: Value) -> Result<ToolCallOutput> {
        let arguments = match args {
            Value::Object(object) => Some(object),
            Value::Null => None,
            _ => {
                return Err(anyhow!(
                    "MCP tool '{tool_name}' requires JSON object arguments"
                ));
            }
        };

        let request = CallToolRequestParams {
            meta: None,
            name: tool_name.to_string().into(),
            arguments,
            task: None,
        };

        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| anyhow!("MCP connection '{}' is not active", self.name))?;

        let result = tokio::time::timeout(
            Duration::from_secs(self.max_call_seconds),
            service.call_tool(request),
        )
        .await
        .map_err(|_| {
            anyhow!(
                "MCP tool '{}' on server '{}' timed out after {}s",
                tool_name,
                self.name,
                self.max_call_seconds
            )
        })?
        .with_context(|| {
            format!(
                "MCP tool '{}' call failed on server '{}'",
                tool_name, self.name
            )
        })?;

        Ok(to_call_output(&result))
    }

    async fn close(&self) -> Result<()> {
        let service = self.service.write().await.take();
        if let Some(service) = service {
            service
                .cancel()
                .await
                .with_context(|| format!("failed to shutdown MCP server '{}'", self.name))?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn disconnected_for_test(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: RwLock::new(None),
            max_call_seconds: 30,
        }
    }
}

impl ToolBackend for McpConnection {
    fn list_tools(&self) -> BoxFuture<'_, anyhow::Result<Vec<ToolDescriptor>>> {
        Box::pin(self.list_descriptors())
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, anyhow::Result<ToolCallOutput>> {
        Box::pin(self.invoke(name, arguments))
    }

    fn shutdown(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(self.close())
    }
}
