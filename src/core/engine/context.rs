//! Reading and writing the backend's current scope and tracking container.

use crate::core::planner::{PlaceholderResolver, ToolDescriptor};
use crate::core::preferences::ContextSelection;
use serde_json::{Map, Value, json};

const ID_KEYS: [&str; 3] = ["sys_id", "id", "value"];
const NAME_KEYS: [&str; 4] = ["name", "label", "title", "display_name"];
const LIST_KEYS: [&str; 4] = ["result", "records", "items", "data"];

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Object(inner)) => string_field(inner, &["value", "display_value"]),
        _ => None,
    })
}

fn selection_from_object(object: &Map<String, Value>) -> Option<ContextSelection> {
    let id = string_field(object, &ID_KEYS)?;
    let name = string_field(object, &NAME_KEYS).unwrap_or_else(|| id.clone());
    Some(ContextSelection { id, name })
}

fn selections_from_json(value: &Value) -> Option<Vec<ContextSelection>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(selection_from_object)
                .collect(),
        ),
        Value::Object(object) => LIST_KEYS
            .iter()
            .find_map(|key| object.get(*key))
            .and_then(selections_from_json)
            .or_else(|| selection_from_object(object).map(|s| vec![s])),
        _ => None,
    }
}

fn selection_from_line(line: &str, resolver: &PlaceholderResolver) -> Option<ContextSelection> {
    let id = resolver.find_identifier(line)?;
    let name = line
        .replace(id, " ")
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | ':' | '(' | ')' | '[' | ']' | ','))
        .filter(|part| !part.is_empty() && !part.eq_ignore_ascii_case("sys_id"))
        .collect::<Vec<_>>()
        .join(" ");
    let name = if name.is_empty() { id.to_string() } else { name };
    Some(ContextSelection::new(id, name))
}

/// Options listed by a backend listing tool. Accepts a JSON array of records,
/// a JSON object wrapping one, or plain lines each carrying an identifier.
pub fn parse_selections(output: &str, resolver: &PlaceholderResolver) -> Vec<ContextSelection> {
    if let Ok(value) = serde_json::from_str::<Value>(output.trim())
        && let Some(selections) = selections_from_json(&value)
    {
        return selections;
    }

    output
        .lines()
        .filter_map(|line| selection_from_line(line, resolver))
        .collect()
}

/// Argument name a state-setting tool expects for the record identifier.
pub fn identifier_argument(tool: Option<&ToolDescriptor>) -> String {
    let Some(tool) = tool else {
        return "sys_id".to_string();
    };
    let declared = tool.argument_names();
    ID_KEYS
        .iter()
        .find(|key| declared.contains(*key))
        .map(ToString::to_string)
        .or_else(|| tool.required_arguments().first().map(ToString::to_string))
        .unwrap_or_else(|| "sys_id".to_string())
}

pub fn set_arguments(tool: Option<&ToolDescriptor>, selection: &ContextSelection) -> Value {
    let mut arguments = Map::new();
    arguments.insert(identifier_argument(tool), json!(selection.id));
    Value::Object(arguments)
}

pub fn create_arguments(tool: Option<&ToolDescriptor>, name: &str, description: &str) -> Value {
    let mut arguments = Map::new();
    arguments.insert("name".to_string(), json!(name));
    if tool.is_some_and(|tool| tool.declares_argument("description")) {
        arguments.insert("description".to_string(), json!(description));
    }
    Value::Object(arguments)
}
