use crate::core::planner::resolver::referenced_steps;
use crate::core::planner::{ExecutionPlan, ExecutionStep, PlanOrigin, ToolDescriptor};
use crate::error::PlanValidationError;
use serde::Deserialize;
use serde_json::Value;

pub struct PlanParser;

/// Both plan shapes the reasoning service may answer with, discriminated by
/// `isChain`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    #[serde(default)]
    is_chain: bool,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    tool_name: String,
    #[serde(default)]
    arguments: Value,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    depends_on: Option<Value>,
}

impl PlanParser {
    pub fn schema_prompt() -> &'static str {
        concat!(
            "Respond with a single JSON object and nothing else.\n\n",
            "For a request one tool can satisfy:\n",
            "{\n",
            "  \"isChain\": false,\n",
            "  \"reasoning\": \"<why this tool>\",\n",
            "  \"steps\": [{ \"toolName\": \"<name>\", \"arguments\": { ... }, \"reasoning\": \"<why>\" }]\n",
            "}\n\n",
            "For a request that needs several tools in sequence:\n",
            "{\n",
            "  \"isChain\": true,\n",
            "  \"reasoning\": \"<overall approach>\",\n",
            "  \"steps\": [\n",
            "    { \"toolName\": \"<name>\", \"arguments\": { ... }, \"reasoning\": \"<why>\" },\n",
            "    { \"toolName\": \"<name>\", \"arguments\": { \"sys_id\": \"{{step_1_result}}\" }, \"reasoning\": \"<why>\", \"dependsOn\": 0 }\n",
            "  ]\n",
            "}\n\n",
            "Use {{step_N_result}} (N counts from 1) wherever a value produced by an earlier step is needed.\n",
            "\"dependsOn\" is the 0-based index of the earlier step and is optional.\n",
            "Only use tool names from the catalog.",
        )
    }

    /// Extract, deserialize, and validate a plan against the session catalog.
    pub fn parse(text: &str, catalog: &[ToolDescriptor]) -> Result<ExecutionPlan, PlanValidationError> {
        let json = Self::extract_json(text)
            .ok_or_else(|| PlanValidationError::Malformed("no JSON object in response".into()))?;
        let raw: RawPlan = serde_json::from_str(json)
            .map_err(|error| PlanValidationError::Malformed(format!("invalid plan JSON: {error}")))?;
        Self::validate(raw, catalog)
    }

    fn validate(raw: RawPlan, catalog: &[ToolDescriptor]) -> Result<ExecutionPlan, PlanValidationError> {
        let RawPlan {
            is_chain,
            reasoning,
            mut steps,
        } = raw;

        if steps.is_empty() {
            return Err(PlanValidationError::EmptyPlan);
        }

        if !is_chain && steps.len() > 1 {
            tracing::warn!(
                steps = steps.len(),
                "non-chain plan carried extra steps; keeping the first"
            );
            steps.truncate(1);
        }

        let mut validated = Vec::with_capacity(steps.len());
        for (index, step) in steps.into_iter().enumerate() {
            let position = index + 1;

            if !catalog.iter().any(|tool| tool.name == step.tool_name) {
                return Err(PlanValidationError::UnknownTool {
                    position,
                    tool_name: step.tool_name,
                });
            }

            let depends_on = step
                .depends_on
                .as_ref()
                .map(|value| parse_dependency(value, position))
                .transpose()?;
            if let Some(dependency) = depends_on
                && dependency >= index
            {
                return Err(PlanValidationError::InvalidDependencyOrder {
                    position,
                    referenced: dependency + 1,
                });
            }

            if let Some(referenced) = referenced_steps(&step.arguments)
                .into_iter()
                .find(|referenced| *referenced == 0 || *referenced > index)
            {
                return Err(PlanValidationError::InvalidDependencyOrder {
                    position,
                    referenced,
                });
            }

            let arguments = match step.arguments {
                Value::Null => Value::Object(serde_json::Map::new()),
                other => other,
            };

            validated.push(ExecutionStep {
                tool_name: step.tool_name,
                arguments,
                rationale: step.reasoning,
                depends_on,
            });
        }

        Ok(ExecutionPlan {
            is_chain,
            rationale: reasoning,
            steps: validated,
            origin: PlanOrigin::Reasoned,
        })
    }

    pub fn extract_json(text: &str) -> Option<&str> {
        if let Some(start) = text.find("```json") {
            let json_start = start + "```json".len();
            let rest = &text[json_start..];
            if let Some(end) = rest.find("```") {
                let candidate = rest[..end].trim();
                if !candidate.is_empty() {
                    return Some(candidate);
                }
            }
        }

        if let Some(start) = text.find("```\n{") {
            let json_start = start + "```\n".len();
            let rest = &text[json_start..];
            if let Some(end) = rest.find("```") {
                let candidate = rest[..end].trim();
                if !candidate.is_empty() {
                    return Some(candidate);
                }
            }
        }

        let open = text.find('{')?;
        let close = text.rfind('}')?;
        if close > open {
            return Some(&text[open..=close]);
        }

        None
    }
}

/// `dependsOn` arrives as a number, or as digits in a string.
fn parse_dependency(value: &Value, position: usize) -> Result<usize, PlanValidationError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<usize>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        PlanValidationError::Malformed(format!("step {position} has an unreadable dependsOn: {value}"))
    })
}
