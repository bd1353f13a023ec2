use crate::core::planner::ExecutionPlan;
use strum::{Display, EnumString};

const READ_ONLY_VOCABULARY: [&str; 7] = ["query", "search", "get", "list", "find", "test", "discover"];

const MUTATING_VOCABULARY: [&str; 9] = [
    "create",
    "add",
    "update",
    "modify",
    "set",
    "implement",
    "delete",
    "remove",
    "change",
];

/// Context a gating tool needs before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum GateRequirement {
    ExecutionScope,
    TrackingContainer,
}

/// Whether a tool changes backend state. Read-only vocabulary wins over
/// mutating vocabulary; names matching neither are treated as read-only.
pub fn is_modifying_tool(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if READ_ONLY_VOCABULARY.iter().any(|word| lower.contains(word)) {
        return false;
    }
    MUTATING_VOCABULARY.iter().any(|word| lower.contains(word))
}

pub fn gate_requirements(name: &str) -> &'static [GateRequirement] {
    if is_modifying_tool(name) {
        &[GateRequirement::ExecutionScope, GateRequirement::TrackingContainer]
    } else {
        &[]
    }
}

pub fn plan_has_gating_step(plan: &ExecutionPlan) -> bool {
    plan.tool_names().any(is_modifying_tool)
}
