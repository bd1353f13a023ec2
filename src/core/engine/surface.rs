use crate::core::chain::ChainObserver;
use crate::core::preferences::ContextSelection;

/// Scope choice presented to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRequest {
    pub request: String,
    /// Gating tools in the plan.
    pub tools: Vec<String>,
    pub options: Vec<ContextSelection>,
    pub current: Option<ContextSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    Select {
        selection: ContextSelection,
        lock: bool,
    },
    Cancel,
}

/// Tracking-container choice presented to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRequest {
    pub request: String,
    pub scope: Option<ContextSelection>,
    pub options: Vec<ContextSelection>,
    pub current: Option<ContextSelection>,
    /// Name a new container would get from the request text.
    pub suggested_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerDecision {
    Select {
        selection: ContextSelection,
        lock: bool,
    },
    /// Create a container named from the template and `description`.
    CreateNew { description: String, lock: bool },
    Cancel,
}

/// Collects operator confirmations while an execution is gated.
pub trait ConfirmationSurface: Send + Sync {
    fn choose_scope(&self, request: &ScopeRequest) -> anyhow::Result<ScopeDecision>;

    fn choose_tracking_container(
        &self,
        request: &ContainerRequest,
    ) -> anyhow::Result<ContainerDecision>;
}

/// Destination for chat output. Step progress arrives through
/// [`ChainObserver`].
pub trait Transcript: ChainObserver {
    fn assistant(&self, text: &str);

    fn notice(&self, text: &str);

    fn error(&self, text: &str);
}
