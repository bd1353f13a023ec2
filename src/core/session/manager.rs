use super::backend::{BackendConnector, BoxFuture, ToolBackend};
use super::content::ToolCallOutput;
use crate::config::BackendConfig;
use crate::core::planner::ToolDescriptor;
use crate::error::ConnectionError;
use anyhow::anyhow;
use arc_swap::ArcSwap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Coarse session state reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error(_) => "error",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {message}", self.label()),
            None => f.write_str(self.label()),
        }
    }
}

/// Retry and discovery bounds for [`ConnectionManager::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    pub attempts: u32,
    pub backoff_step: Duration,
    pub backoff_cap: Duration,
    pub discovery_timeout: Duration,
}

impl ConnectPolicy {
    /// Wait after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step
            .saturating_mul(attempt)
            .min(self.backoff_cap)
    }
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::from(&BackendConfig::default())
    }
}

impl From<&BackendConfig> for ConnectPolicy {
    fn from(config: &BackendConfig) -> Self {
        Self {
            attempts: config.connect_attempts.max(1),
            backoff_step: Duration::from_millis(config.backoff_step_ms),
            backoff_cap: Duration::from_millis(config.backoff_cap_ms),
            discovery_timeout: config.discovery_timeout(),
        }
    }
}

/// Sole owner of the backend session.
///
/// Status and catalog reads are lock-free snapshots so they can be answered
/// while a connection attempt or tool call is in flight.
pub struct ConnectionManager {
    connector: Arc<dyn BackendConnector>,
    policy: ConnectPolicy,
    status: ArcSwap<ConnectionStatus>,
    catalog: ArcSwap<Vec<ToolDescriptor>>,
    session: RwLock<Option<Arc<dyn ToolBackend>>>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn BackendConnector>, policy: ConnectPolicy) -> Self {
        Self {
            connector,
            policy,
            status: ArcSwap::from_pointee(ConnectionStatus::Disconnected),
            catalog: ArcSwap::from_pointee(Vec::new()),
            session: RwLock::new(None),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.load().as_ref().clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(**self.status.load(), ConnectionStatus::Connected)
    }

    /// Tool catalog discovered by the last successful connection.
    pub fn tools(&self) -> Arc<Vec<ToolDescriptor>> {
        self.catalog.load_full()
    }

    fn set_status(&self, status: ConnectionStatus) {
        tracing::debug!(status = %status, "backend status changed");
        self.status.store(Arc::new(status));
    }

    /// Establish a session and discover its catalog, retrying with a capped
    /// linear backoff.
    pub async fn connect(&self) -> Result<Arc<Vec<ToolDescriptor>>, ConnectionError> {
        let attempts = self.policy.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            self.set_status(ConnectionStatus::Connecting);

            match self.try_connect().await {
                Ok((backend, tools)) => {
                    tracing::info!(attempt, tools = tools.len(), "backend session established");
                    let previous = self.session.write().await.replace(backend);
                    if let Some(previous) = previous {
                        shutdown_quietly(previous.as_ref()).await;
                    }
                    self.catalog.store(Arc::new(tools));
                    self.set_status(ConnectionStatus::Connected);
                    return Ok(self.tools());
                }
                Err(error) => {
                    tracing::warn!(attempt, attempts, error = %error, "backend connection attempt failed");
                    last_error = format!("{error:#}");
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        let error = ConnectionError::Exhausted {
            attempts,
            last_error,
        };
        self.set_status(ConnectionStatus::Error(error.to_string()));
        Err(error)
    }

    async fn try_connect(&self) -> anyhow::Result<(Arc<dyn ToolBackend>, Vec<ToolDescriptor>)> {
        let backend = self.connector.connect().await?;

        match tokio::time::timeout(self.policy.discovery_timeout, backend.list_tools()).await {
            Ok(Ok(tools)) => Ok((backend, tools)),
            Ok(Err(error)) => {
                shutdown_quietly(backend.as_ref()).await;
                Err(error.context("tool discovery failed"))
            }
            Err(_) => {
                shutdown_quietly(backend.as_ref()).await;
                Err(ConnectionError::DiscoveryTimeout {
                    seconds: self.policy.discovery_timeout.as_secs(),
                }
                .into())
            }
        }
    }

    async fn active_session(&self) -> anyhow::Result<Arc<dyn ToolBackend>> {
        self.session
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| anyhow!(ConnectionError::NotConnected))
    }

    /// Re-list tools under the discovery bound. A failure flips the status to
    /// `Error` and returns `false`.
    pub async fn check_liveness(&self) -> bool {
        if !self.is_connected() {
            return false;
        }

        let probe = async {
            let session = self.active_session().await?;
            tokio::time::timeout(self.policy.discovery_timeout, session.list_tools())
                .await
                .map_err(|_| anyhow!("liveness check timed out"))?
        };

        match probe.await {
            Ok(tools) => {
                self.catalog.store(Arc::new(tools));
                true
            }
            Err(error) => {
                tracing::warn!(error = %error, "backend liveness check failed");
                self.set_status(ConnectionStatus::Error(format!("{error:#}")));
                false
            }
        }
    }

    pub async fn disconnect(&self) -> anyhow::Result<()> {
        let session = self.session.write().await.take();
        self.catalog.store(Arc::new(Vec::new()));
        self.set_status(ConnectionStatus::Disconnected);

        if let Some(session) = session {
            session.shutdown().await?;
        }
        tracing::info!("disconnected from backend");
        Ok(())
    }
}

async fn shutdown_quietly(backend: &dyn ToolBackend) {
    if let Err(error) = backend.shutdown().await {
        tracing::debug!(error = %error, "failed to shut down abandoned backend session");
    }
}

impl ToolBackend for ConnectionManager {
    fn list_tools(&self) -> BoxFuture<'_, anyhow::Result<Vec<ToolDescriptor>>> {
        Box::pin(async move {
            let session = self.active_session().await?;
            let tools = session.list_tools().await?;
            self.catalog.store(Arc::new(tools.clone()));
            Ok(tools)
        })
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: Value,
    ) -> BoxFuture<'a, anyhow::Result<ToolCallOutput>> {
        Box::pin(async move {
            let session = self.active_session().await?;
            session.call_tool(name, arguments).await
        })
    }
}
