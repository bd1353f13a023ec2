use crate::core::planner::{ExecutionPlan, ExecutionStep, PlanOrigin, ToolDescriptor};
use crate::error::PlanValidationError;
use serde_json::{Map, Value, json};

/// Intent phrases mapped to the tool-name fragment they select, checked in order.
const INTENT_RULES: &[(&[&str], &str)] = &[
    (
        &["how many", "count", "list", "show", "find", "search", "what"],
        "query",
    ),
    (&["create", "add", "new", "make"], "create"),
    (&["update", "change", "modify", "set"], "update"),
    (&["delete", "remove"], "delete"),
];

/// Deterministic single-step planner used when the reasoning service's plan
/// cannot be used. Never chains.
pub struct HeuristicPlanner;

impl HeuristicPlanner {
    pub fn plan(request: &str, catalog: &[ToolDescriptor]) -> Result<ExecutionPlan, PlanValidationError> {
        if catalog.is_empty() {
            return Err(PlanValidationError::NoTools);
        }

        let lowered = request.to_lowercase();
        let (tool, reason) = match_intent(&lowered, catalog)
            .or_else(|| match_keywords(&lowered, catalog))
            .unwrap_or_else(|| default_tool(catalog));

        tracing::info!(tool = %tool.name, reason = %reason, "fallback planner selected tool");

        let step = ExecutionStep::new(tool.name.clone(), fallback_arguments(request, tool))
            .with_rationale(reason.clone());
        Ok(ExecutionPlan::single(step, reason, PlanOrigin::Fallback))
    }
}

fn match_intent<'a>(request: &str, catalog: &'a [ToolDescriptor]) -> Option<(&'a ToolDescriptor, String)> {
    for (phrases, fragment) in INTENT_RULES {
        let Some(phrase) = phrases.iter().find(|phrase| contains_phrase(request, phrase)) else {
            continue;
        };
        if let Some(tool) = catalog
            .iter()
            .find(|tool| tool.name.to_lowercase().contains(fragment))
        {
            return Some((
                tool,
                format!("matched \"{phrase}\" to a {fragment} tool"),
            ));
        }
    }
    None
}

/// Phrase match on word boundaries so "set" does not fire inside "reset".
fn contains_phrase(request: &str, phrase: &str) -> bool {
    request.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before = request[..start].chars().next_back();
        let after = request[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn match_keywords<'a>(request: &str, catalog: &'a [ToolDescriptor]) -> Option<(&'a ToolDescriptor, String)> {
    let words: Vec<&str> = request
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| word.chars().count() >= 3)
        .collect();
    if words.is_empty() {
        return None;
    }

    let mut best: Option<(&ToolDescriptor, usize)> = None;
    for tool in catalog {
        let haystack = format!("{} {}", tool.name, tool.description).to_lowercase();
        let score = words.iter().filter(|word| haystack.contains(**word)).count();
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((tool, score));
        }
    }

    best.map(|(tool, score)| (tool, format!("{score} request keyword(s) matched {}", tool.name)))
}

fn default_tool(catalog: &[ToolDescriptor]) -> (&ToolDescriptor, String) {
    catalog
        .iter()
        .find(|tool| tool.name.to_lowercase().contains("query"))
        .map_or_else(
            || (&catalog[0], "no keyword matched; using the first tool".to_string()),
            |tool| (tool, "no keyword matched; defaulting to a query tool".to_string()),
        )
}

fn fallback_arguments(request: &str, tool: &ToolDescriptor) -> Value {
    if tool.declares_argument("query") {
        json!({ "query": request })
    } else {
        Value::Object(Map::new())
    }
}
