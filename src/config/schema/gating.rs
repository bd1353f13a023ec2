use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"\b[0-9a-fA-F]{32}\b";

fn default_identifier_pattern() -> String {
    DEFAULT_IDENTIFIER_PATTERN.to_string()
}

fn default_container_prefix() -> String {
    "AI".to_string()
}

fn default_scope_list_tool() -> String {
    "list-applications".to_string()
}

fn default_scope_set_tool() -> String {
    "set-current-application".to_string()
}

fn default_container_list_tool() -> String {
    "list-update-sets".to_string()
}

fn default_container_create_tool() -> String {
    "create-update-set".to_string()
}

fn default_container_set_tool() -> String {
    "set-current-update-set".to_string()
}

/// Planner tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Regex used to pull a record identifier out of a prior step's output.
    #[serde(default = "default_identifier_pattern")]
    pub identifier_pattern: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            identifier_pattern: default_identifier_pattern(),
        }
    }
}

/// What happens to a gated request when a new chat request arrives.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SingleFlightPolicy {
    /// Refuse the new request until the pending one is confirmed or cancelled.
    #[default]
    Reject,
    /// Drop the pending execution and gate the new request instead.
    Supersede,
}

/// Backend context tools and gating behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatingConfig {
    /// Prefix substituted for `{prefix}` in the container naming template.
    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,

    #[serde(default)]
    pub single_flight: SingleFlightPolicy,

    #[serde(default = "default_scope_list_tool")]
    pub scope_list_tool: String,

    #[serde(default = "default_scope_set_tool")]
    pub scope_set_tool: String,

    #[serde(default = "default_container_list_tool")]
    pub container_list_tool: String,

    #[serde(default = "default_container_create_tool")]
    pub container_create_tool: String,

    #[serde(default = "default_container_set_tool")]
    pub container_set_tool: String,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            container_prefix: default_container_prefix(),
            single_flight: SingleFlightPolicy::default(),
            scope_list_tool: default_scope_list_tool(),
            scope_set_tool: default_scope_set_tool(),
            container_list_tool: default_container_list_tool(),
            container_create_tool: default_container_create_tool(),
            container_set_tool: default_container_set_tool(),
        }
    }
}
