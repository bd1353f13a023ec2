use thiserror::Error;

use crate::core::chain::StepResult;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chainpilot`.
///
/// Each engine component defines its own error variant. Callers match on
/// these to pick a recovery strategy; I/O plumbing keeps using
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Session / backend connection ────────────────────────────────────
    #[error("connection: {0}")]
    Connection(#[from] ConnectionError),

    // ── Plan validation ─────────────────────────────────────────────────
    #[error("plan: {0}")]
    PlanValidation(#[from] PlanValidationError),

    // ── Chain execution ─────────────────────────────────────────────────
    #[error("chain: {0}")]
    StepExecution(#[from] StepExecutionError),

    // ── Reasoning service ───────────────────────────────────────────────
    #[error("reasoning: {0}")]
    Reasoning(#[from] ReasoningError),

    // ── Preferences ─────────────────────────────────────────────────────
    #[error("preferences: {0}")]
    Persistence(#[from] PersistenceError),

    // ── Single-flight gating ────────────────────────────────────────────
    #[error("a request is already awaiting confirmation: {request}")]
    Busy { request: String },

    #[error("no execution is awaiting confirmation")]
    NoPendingExecution,

    #[error("confirmation out of order: expected {expected}, got {got}")]
    UnexpectedConfirmation {
        expected: &'static str,
        got: &'static str,
    },

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Connection errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("tool discovery timed out after {seconds}s")]
    DiscoveryTimeout { seconds: u64 },

    #[error("backend is not connected")]
    NotConnected,
}

// ─── Plan validation errors ─────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanValidationError {
    #[error("malformed plan: {0}")]
    Malformed(String),

    #[error("plan must contain at least one step")]
    EmptyPlan,

    #[error("step {position} references unknown tool '{tool_name}'")]
    UnknownTool { position: usize, tool_name: String },

    #[error("step {position} depends on step {referenced}, which does not run before it")]
    InvalidDependencyOrder { position: usize, referenced: usize },

    #[error("no tools are available to plan with")]
    NoTools,
}

// ─── Step execution errors ──────────────────────────────────────────────────

/// A chain stopped at `position` (1-based). Results of the steps that already
/// ran are carried along; their side effects on the backend stay committed.
#[derive(Debug, Error)]
#[error("step {position} ({tool_name}) failed: {message}")]
pub struct StepExecutionError {
    pub position: usize,
    pub tool_name: String,
    pub message: String,
    pub completed: Vec<StepResult>,
}

// ─── Reasoning service errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning service {service} request failed: {message}")]
    Request { service: String, message: String },

    #[error("reasoning service returned an empty response")]
    EmptyResponse,
}

// ─── Persistence errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read preferences: {0}")]
    Load(String),

    #[error("failed to write preferences: {0}")]
    Save(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
