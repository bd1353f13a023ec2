use serde::{Deserialize, Serialize};

/// Structured content returned by a backend tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Plain text content.
    Text { text: String },

    /// Base64-encoded image content.
    Image {
        mime_type: String,
        /// Base64-encoded image data.
        data: String,
    },

    /// Reference to an external resource.
    Resource {
        uri: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

/// Render content items to plain text.
///
/// Text items are concatenated with newlines.
/// Non-text items produce descriptive placeholders.
pub fn render_content_to_text(content: &[ToolContent]) -> String {
    content
        .iter()
        .map(|item| match item {
            ToolContent::Text { text } => text.clone(),
            ToolContent::Image { mime_type, .. } => {
                format!("[Image: {mime_type}]")
            }
            ToolContent::Resource { uri, name, .. } => {
                if let Some(name) = name {
                    format!("[Resource: {name} ({uri})]")
                } else {
                    format!("[Resource: {uri}]")
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result of `callTool`. `is_error` marks a failure reported by the backend
/// itself, as opposed to a transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallOutput {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCallOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    pub fn render(&self) -> String {
        render_content_to_text(&self.content)
    }
}
