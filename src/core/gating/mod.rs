mod classify;
mod controller;
mod naming;

pub use classify::{GateRequirement, gate_requirements, is_modifying_tool, plan_has_gating_step};
pub use controller::{
    GateEvaluation, GateStage, GateState, GatingController, PendingExecution, evaluate,
    needs_scope, needs_tracking_container,
};
pub use naming::render_container_name;
