use super::classify::plan_has_gating_step;
use crate::config::SingleFlightPolicy;
use crate::core::planner::ExecutionPlan;
use crate::core::preferences::Preferences;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A validated plan waiting for gating to resolve.
#[derive(Debug, Clone)]
pub struct PendingExecution {
    pub id: Uuid,
    pub request: String,
    pub plan: ExecutionPlan,
    pub created_at: DateTime<Utc>,
}

impl PendingExecution {
    pub fn new(request: impl Into<String>, plan: ExecutionPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            request: request.into(),
            plan,
            created_at: Utc::now(),
        }
    }
}

/// Which confirmations a plan needs under the given preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateEvaluation {
    pub has_gating_step: bool,
    pub needs_scope: bool,
    pub needs_tracking_container: bool,
}

pub fn needs_scope(plan: &ExecutionPlan, preferences: &Preferences) -> bool {
    let scope = &preferences.execution_scope;
    plan_has_gating_step(plan) && scope.enabled && !scope.locked
}

pub fn needs_tracking_container(plan: &ExecutionPlan, preferences: &Preferences) -> bool {
    let container = &preferences.tracking_container;
    plan_has_gating_step(plan) && container.enabled && !container.locked
}

pub fn evaluate(plan: &ExecutionPlan, preferences: &Preferences) -> GateEvaluation {
    GateEvaluation {
        has_gating_step: plan_has_gating_step(plan),
        needs_scope: needs_scope(plan, preferences),
        needs_tracking_container: needs_tracking_container(plan, preferences),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GateStage {
    AwaitingScope,
    AwaitingTrackingContainer,
    Ready,
}

#[derive(Debug, Default)]
pub enum GateState {
    #[default]
    Idle,
    AwaitingScope(PendingExecution),
    AwaitingTrackingContainer(PendingExecution),
    Ready(PendingExecution),
}

impl GateState {
    pub fn stage(&self) -> Option<GateStage> {
        match self {
            Self::Idle => None,
            Self::AwaitingScope(_) => Some(GateStage::AwaitingScope),
            Self::AwaitingTrackingContainer(_) => Some(GateStage::AwaitingTrackingContainer),
            Self::Ready(_) => Some(GateStage::Ready),
        }
    }

    fn pending(&self) -> Option<&PendingExecution> {
        match self {
            Self::Idle => None,
            Self::AwaitingScope(p) | Self::AwaitingTrackingContainer(p) | Self::Ready(p) => Some(p),
        }
    }
}

/// Single-flight gating state machine. Transitions are driven by independent
/// calls so the suspended execution can outlive any one call stack.
#[derive(Debug)]
pub struct GatingController {
    state: GateState,
    policy: SingleFlightPolicy,
}

impl GatingController {
    pub fn new(policy: SingleFlightPolicy) -> Self {
        Self {
            state: GateState::Idle,
            policy,
        }
    }

    pub fn stage(&self) -> Option<GateStage> {
        self.state.stage()
    }

    pub fn pending(&self) -> Option<&PendingExecution> {
        self.state.pending()
    }

    /// Accept a new plan. With an execution already pending, `Reject` fails
    /// with `Busy` and `Supersede` discards the old one.
    pub fn begin(
        &mut self,
        request: &str,
        plan: ExecutionPlan,
        preferences: &Preferences,
    ) -> Result<GateStage, EngineError> {
        if let Some(pending) = self.state.pending() {
            match self.policy {
                SingleFlightPolicy::Reject => {
                    return Err(EngineError::Busy {
                        request: pending.request.clone(),
                    });
                }
                SingleFlightPolicy::Supersede => {
                    tracing::warn!(
                        pending_id = %pending.id,
                        pending_request = %pending.request,
                        "superseding pending execution"
                    );
                }
            }
        }

        let evaluation = evaluate(&plan, preferences);
        let pending = PendingExecution::new(request, plan);
        tracing::debug!(
            pending_id = %pending.id,
            gating = evaluation.has_gating_step,
            needs_scope = evaluation.needs_scope,
            needs_tracking_container = evaluation.needs_tracking_container,
            "gating evaluated"
        );

        self.state = if evaluation.needs_scope {
            GateState::AwaitingScope(pending)
        } else if evaluation.needs_tracking_container {
            GateState::AwaitingTrackingContainer(pending)
        } else {
            GateState::Ready(pending)
        };
        self.stage().ok_or(EngineError::NoPendingExecution)
    }

    /// Scope has been chosen and persisted. `preferences` must already
    /// reflect the confirmation.
    pub fn confirm_scope(&mut self, preferences: &Preferences) -> Result<GateStage, EngineError> {
        let state = std::mem::take(&mut self.state);
        let GateState::AwaitingScope(pending) = state else {
            return Err(self.restore_and_reject(state, GateStage::AwaitingScope));
        };

        self.state = if needs_tracking_container(&pending.plan, preferences) {
            GateState::AwaitingTrackingContainer(pending)
        } else {
            GateState::Ready(pending)
        };
        self.stage().ok_or(EngineError::NoPendingExecution)
    }

    pub fn confirm_tracking_container(&mut self) -> Result<GateStage, EngineError> {
        let state = std::mem::take(&mut self.state);
        let GateState::AwaitingTrackingContainer(pending) = state else {
            return Err(self.restore_and_reject(state, GateStage::AwaitingTrackingContainer));
        };

        self.state = GateState::Ready(pending);
        Ok(GateStage::Ready)
    }

    /// Discard whatever is pending. Nothing has reached the backend yet.
    pub fn cancel(&mut self) -> Option<PendingExecution> {
        let pending = match std::mem::take(&mut self.state) {
            GateState::Idle => None,
            GateState::AwaitingScope(p)
            | GateState::AwaitingTrackingContainer(p)
            | GateState::Ready(p) => Some(p),
        };
        if let Some(pending) = &pending {
            tracing::info!(pending_id = %pending.id, "pending execution cancelled");
        }
        pending
    }

    /// Hand a ready execution to the chain runner and return to idle.
    pub fn take_ready(&mut self) -> Result<PendingExecution, EngineError> {
        let state = std::mem::take(&mut self.state);
        let GateState::Ready(pending) = state else {
            return Err(self.restore_and_reject(state, GateStage::Ready));
        };
        Ok(pending)
    }

    fn restore_and_reject(&mut self, state: GateState, expected: GateStage) -> EngineError {
        let error = match state.stage() {
            None => EngineError::NoPendingExecution,
            Some(got) => EngineError::UnexpectedConfirmation {
                expected: expected.into(),
                got: got.into(),
            },
        };
        self.state = state;
        error
    }
}
