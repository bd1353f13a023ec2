use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One operation advertised by the tool-providing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments.
    pub argument_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            argument_schema: schema,
        }
    }

    /// Names listed in the schema's `required` array.
    pub fn required_arguments(&self) -> Vec<&str> {
        self.argument_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|required| required.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Names declared under the schema's `properties`.
    pub fn argument_names(&self) -> Vec<&str> {
        self.argument_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn declares_argument(&self, name: &str) -> bool {
        self.argument_names().contains(&name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub tool_name: String,
    /// Untyped argument tree; may contain `{{step_N_result}}` tokens.
    pub arguments: Value,
    /// Human-readable and non-authoritative.
    pub rationale: String,
    /// 0-based index of an earlier step this one consumes.
    pub depends_on: Option<usize>,
}

impl ExecutionStep {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            rationale: String::new(),
            depends_on: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_depends_on(mut self, index: usize) -> Self {
        self.depends_on = Some(index);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    /// Proposed by the reasoning service and validated.
    Reasoned,
    /// Derived by keyword matching after the proposal was rejected.
    Fallback,
}

/// Validated, ordered list of tool invocations for one request.
///
/// Step order is execution order. Steps only ever reference results of steps
/// at a lower index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub is_chain: bool,
    pub rationale: String,
    pub steps: Vec<ExecutionStep>,
    pub origin: PlanOrigin,
}

impl ExecutionPlan {
    pub fn single(step: ExecutionStep, rationale: impl Into<String>, origin: PlanOrigin) -> Self {
        Self {
            is_chain: false,
            rationale: rationale.into(),
            steps: vec![step],
            origin,
        }
    }

    pub fn chain(steps: Vec<ExecutionStep>, rationale: impl Into<String>) -> Self {
        Self {
            is_chain: true,
            rationale: rationale.into(),
            steps,
            origin: PlanOrigin::Reasoned,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.tool_name.as_str())
    }
}
