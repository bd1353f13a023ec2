use crate::core::chain::StepResult;
use crate::core::planner::{ExecutionPlan, PlanParser, ToolDescriptor};
use serde_json::json;
use std::fmt::Write;

pub const PLANNER_SYSTEM_PROMPT: &str = "You plan administrative operations against a \
service-management platform. You can only act through the tools listed in the catalog. \
Pick the smallest sequence of tool calls that fulfils the operator's request.";

pub const RESPONDER_SYSTEM_PROMPT: &str = "You explain the results of administrative tool \
calls to an operator. Be concise, quote identifiers exactly, and say plainly when a result \
looks empty or unexpected.";

/// Catalog as compact JSON lines: name, description, argument schema.
pub fn render_catalog(catalog: &[ToolDescriptor]) -> String {
    catalog
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "arguments": tool.argument_schema,
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn planning_prompt(request: &str, catalog: &[ToolDescriptor]) -> String {
    format!(
        "Tool catalog (one JSON object per line):\n{}\n\nOperator request:\n{}\n\n{}",
        render_catalog(catalog),
        request.trim(),
        PlanParser::schema_prompt()
    )
}

/// Prompt used to turn step output into the final answer. Chains get every
/// step; a single step gets its one result.
pub fn response_prompt(request: &str, plan: &ExecutionPlan, results: &[StepResult]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Operator request:\n{}\n", request.trim());
    if plan.is_chain {
        let _ = writeln!(
            prompt,
            "The request was handled as a chain of {} tool calls. Summarize what happened overall.\n",
            results.len()
        );
    } else {
        let _ = writeln!(prompt, "The request was handled by one tool call. Answer the operator using its output.\n");
    }

    for result in results {
        let _ = writeln!(
            prompt,
            "Step {}: {}\nArguments: {}\nOutput:\n{}\n",
            result.step_index + 1,
            result.tool_name,
            result.resolved_arguments,
            result.raw_output.trim()
        );
    }
    prompt
}
