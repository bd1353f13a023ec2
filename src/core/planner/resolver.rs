//! Substitution of `{{step_N_result}}` tokens with identifiers pulled out of
//! earlier step output.

use crate::core::chain::StepResult;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*step_(\d+)_result\s*\}\}").expect("placeholder pattern is valid")
});

/// Marker substituted when step `position` produced no recognizable identifier.
pub fn unresolved_marker(position: usize) -> String {
    format!("result_from_step_{position}")
}

/// 1-based step positions referenced anywhere in `value`, in traversal order.
pub fn referenced_steps(value: &Value) -> Vec<usize> {
    let mut positions = Vec::new();
    collect_references(value, &mut positions);
    positions
}

fn collect_references(value: &Value, positions: &mut Vec<usize>) {
    match value {
        Value::String(text) => {
            for caps in PLACEHOLDER_RE.captures_iter(text) {
                positions.push(caps[1].parse().unwrap_or(0));
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, positions);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_references(item, positions);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Rewrites argument trees against the results produced so far.
///
/// Never fails: a miss yields [`unresolved_marker`] so the backend reports a
/// readable error downstream.
#[derive(Debug, Clone)]
pub struct PlaceholderResolver {
    identifier: Regex,
}

impl PlaceholderResolver {
    pub fn new(identifier_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            identifier: Regex::new(identifier_pattern)?,
        })
    }

    /// Build a new tree; `arguments` is left untouched.
    pub fn resolve(&self, arguments: &Value, results: &[StepResult]) -> Value {
        match arguments {
            Value::String(text) => Value::String(self.resolve_text(text, results)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item, results))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.resolve(item, results)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_text(&self, text: &str, results: &[StepResult]) -> String {
        if !PLACEHOLDER_RE.is_match(text) {
            return text.to_string();
        }

        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let position = caps[1].parse().unwrap_or(0);
                self.extract(position, results)
            })
            .into_owned()
    }

    /// First identifier-shaped token in `text`.
    pub fn find_identifier<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.identifier.find(text).map(|found| found.as_str())
    }

    /// Identifier found in the output of step `position` (1-based).
    pub fn extract(&self, position: usize, results: &[StepResult]) -> String {
        let found = position
            .checked_sub(1)
            .and_then(|index| results.iter().find(|result| result.step_index == index))
            .and_then(|result| self.find_identifier(&result.raw_output))
            .map(ToString::to_string);

        found.unwrap_or_else(|| {
            tracing::debug!(step = position, "no identifier found for placeholder");
            unresolved_marker(position)
        })
    }
}
