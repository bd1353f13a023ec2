use super::super::{BackendConfig, GatingConfig, PlannerConfig, ReasoningConfig};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Where operator preferences are persisted. Defaults to
    /// `<data_dir>/preferences.json`; `~` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<String>,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub reasoning: ReasoningConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub gating: GatingConfig,
}

impl Config {
    pub fn resolved_preferences_path(&self) -> PathBuf {
        match self.preferences_path.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
            }
            _ => self.data_dir.join("preferences.json"),
        }
    }

    /// Aggregate validation across sections. Backend command is checked
    /// separately because several subcommands run without a backend.
    pub fn validate(&self) -> Result<()> {
        let mut errors = self.reasoning.validate();
        if let Err(error) = regex::Regex::new(&self.planner.identifier_pattern) {
            errors.push(format!("planner identifier_pattern is invalid: {error}"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            bail!("invalid configuration: {}", errors.join("; "))
        }
    }
}
