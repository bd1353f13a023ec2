use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

fn default_name() -> String {
    "backend".to_string()
}

fn default_max_call_seconds() -> u64 {
    30
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    1_000
}

fn default_backoff_cap_ms() -> u64 {
    3_000
}

fn default_discovery_timeout_secs() -> u64 {
    5
}

/// Tool-providing backend (MCP server over stdio).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Display name used in logs and status output.
    #[serde(default = "default_name")]
    pub name: String,

    /// Executable that speaks MCP on stdin/stdout.
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the spawned server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Maximum seconds per tool call.
    #[serde(default = "default_max_call_seconds")]
    pub max_call_seconds: u64,

    /// Session establishment attempts before giving up.
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Linear backoff step between attempts.
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,

    /// Upper bound for a single backoff wait.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Bound on `tools/list` right after the session starts.
    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            command: String::new(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            max_call_seconds: default_max_call_seconds(),
            connect_attempts: default_connect_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            discovery_timeout_secs: default_discovery_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Validate the configuration, returning errors for invalid entries.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("backend name cannot be empty".to_string());
        }
        if self.command.trim().is_empty() {
            errors.push(format!(
                "backend '{}': stdio transport requires a command",
                self.name
            ));
        }
        if self.max_call_seconds == 0 {
            errors.push(format!(
                "backend '{}': max_call_seconds must be > 0",
                self.name
            ));
        }
        if self.connect_attempts == 0 {
            errors.push(format!(
                "backend '{}': connect_attempts must be > 0",
                self.name
            ));
        }
        if self.discovery_timeout_secs == 0 {
            errors.push(format!(
                "backend '{}': discovery_timeout_secs must be > 0",
                self.name
            ));
        }

        errors
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based):
    /// `min(attempt * step, cap)`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let step = self.backoff_step_ms.saturating_mul(u64::from(attempt));
        Duration::from_millis(step.min(self.backoff_cap_ms))
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}
