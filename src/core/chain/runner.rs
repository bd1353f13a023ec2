use crate::core::planner::{ExecutionPlan, ExecutionStep, PlaceholderResolver};
use crate::core::session::ToolBackend;
use crate::error::StepExecutionError;
use serde::Serialize;
use serde_json::Value;

/// Output of one successful step. Produced exactly once per step, in plan order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// 0-based position in the plan.
    pub step_index: usize,
    pub tool_name: String,
    pub raw_output: String,
    pub resolved_arguments: Value,
}

/// Progress notifications emitted while a chain runs.
pub trait ChainObserver: Send + Sync {
    fn step_started(&self, _position: usize, _total: usize, _step: &ExecutionStep) {}

    fn step_finished(&self, _result: &StepResult) {}
}

/// Observer that discards every notification.
pub struct NullObserver;

impl ChainObserver for NullObserver {}

/// Executes a validated plan step by step against a backend.
pub struct ChainRunner {
    resolver: PlaceholderResolver,
}

impl ChainRunner {
    pub fn new(resolver: PlaceholderResolver) -> Self {
        Self { resolver }
    }

    /// Run every step in order. Placeholders in step `i` are resolved against
    /// the results of steps `0..i`. The first failure stops the chain; steps
    /// that already ran are not rolled back.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        backend: &dyn ToolBackend,
        observer: &dyn ChainObserver,
    ) -> Result<Vec<StepResult>, StepExecutionError> {
        let total = plan.steps.len();
        let mut results: Vec<StepResult> = Vec::with_capacity(total);

        for (index, step) in plan.steps.iter().enumerate() {
            let position = index + 1;
            let arguments = self.resolver.resolve(&step.arguments, &results);

            observer.step_started(position, total, step);
            tracing::info!(step = position, total, tool = %step.tool_name, "running step");

            let failure = match backend.call_tool(&step.tool_name, arguments.clone()).await {
                Ok(output) if !output.is_error => {
                    let result = StepResult {
                        step_index: index,
                        tool_name: step.tool_name.clone(),
                        raw_output: output.render(),
                        resolved_arguments: arguments,
                    };
                    observer.step_finished(&result);
                    results.push(result);
                    continue;
                }
                Ok(output) => output.render(),
                Err(error) => format!("{error:#}"),
            };

            tracing::warn!(
                step = position,
                tool = %step.tool_name,
                completed = results.len(),
                error = %failure,
                "step failed, stopping chain"
            );
            return Err(StepExecutionError {
                position,
                tool_name: step.tool_name.clone(),
                message: failure,
                completed: results,
            });
        }

        Ok(results)
    }
}
