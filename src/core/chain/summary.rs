use super::StepResult;
use crate::core::planner::ExecutionPlan;
use crate::core::planner::prompt::{RESPONDER_SYSTEM_PROMPT, response_prompt};
use crate::core::providers::ReasoningService;
use std::fmt::Write;

/// Plain concatenation of step outputs, used when the reasoning service is
/// unavailable.
pub fn deterministic_summary(results: &[StepResult]) -> String {
    let mut out = String::new();
    for result in results {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        let _ = write!(
            out,
            "Step {} ({}):\n{}",
            result.step_index + 1,
            result.tool_name,
            result.raw_output.trim_end()
        );
    }
    out
}

/// Turn step results into the assistant's answer. Never fails: a reasoning
/// error degrades to [`deterministic_summary`].
pub async fn compose_response(
    reasoner: &dyn ReasoningService,
    request: &str,
    plan: &ExecutionPlan,
    results: &[StepResult],
) -> String {
    if results.is_empty() {
        return String::new();
    }

    let prompt = response_prompt(request, plan, results);
    match reasoner.complete(RESPONDER_SYSTEM_PROMPT, &prompt).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!(service = reasoner.name(), "empty response summary, using raw output");
            deterministic_summary(results)
        }
        Err(error) => {
            tracing::warn!(
                service = reasoner.name(),
                error = %format!("{error:#}"),
                "response summary failed, using raw output"
            );
            deterministic_summary(results)
        }
    }
}
