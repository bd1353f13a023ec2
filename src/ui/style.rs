use console::style;
use std::fmt::Display;

/// Completed steps and applied selections.
pub fn success<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Identifiers, rationales and other secondary text.
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Warnings and unconfigured fields.
pub fn yellow<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

pub fn value<D: Display>(text: D) -> String {
    style(text).green().to_string()
}

/// Step counters in chain progress.
pub fn accent<D: Display>(text: D) -> String {
    style(text).cyan().bold().to_string()
}

/// Field labels in status output.
pub fn cyan<D: Display>(text: D) -> String {
    style(text).cyan().to_string()
}
