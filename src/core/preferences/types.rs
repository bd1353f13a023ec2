use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMING_TEMPLATE: &str = "{prefix}_{date}_{description}";

fn default_true() -> bool {
    true
}

fn default_naming_template() -> String {
    DEFAULT_NAMING_TEMPLATE.to_string()
}

/// A backend object chosen by the operator (an application scope or an
/// update set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSelection {
    pub id: String,
    pub name: String,
}

impl ContextSelection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingContainerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Locked settings reuse `current_selection` without prompting.
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_selection: Option<ContextSelection>,
    #[serde(default = "default_naming_template")]
    pub naming_template: String,
}

impl Default for TrackingContainerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            locked: false,
            current_selection: None,
            naming_template: default_naming_template(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionScopeSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_selection: Option<ContextSelection>,
}

impl Default for ExecutionScopeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            locked: false,
            current_selection: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub tracking_container: TrackingContainerSettings,
    #[serde(default)]
    pub execution_scope: ExecutionScopeSettings,
}
