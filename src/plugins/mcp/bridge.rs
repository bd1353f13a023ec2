//! Conversion from rmcp protocol types to session types.
//!
//! `Content` in rmcp is `Annotated<RawContent>` which derefs to `RawContent`.
//! Variants: `Text(RawTextContent)`, `Image(RawImageContent)`,
//! `Resource(RawEmbeddedResource)`, `Audio(RawAudioContent)`,
//! `ResourceLink(RawResource)`.

use crate::core::planner::ToolDescriptor;
use crate::core::session::{ToolCallOutput, ToolContent};

/// Convert an rmcp `Content` item to a `ToolContent`.
///
/// Audio produces a text placeholder; resource links keep their name.
pub fn from_rmcp_content(content: &rmcp::model::Content) -> ToolContent {
    use rmcp::model::RawContent;
    match &content.raw {
        RawContent::Text(text_content) => ToolContent::Text {
            text: text_content.text.clone(),
        },
        RawContent::Image(image_content) => ToolContent::Image {
            mime_type: image_content.mime_type.clone(),
            data: image_content.data.clone(),
        },
        RawContent::Resource(embedded) => match &embedded.resource {
            rmcp::model::ResourceContents::TextResourceContents { uri, text, .. } => {
                ToolContent::Text {
                    text: format!("{text}\n[Resource: {uri}]"),
                }
            }
            rmcp::model::ResourceContents::BlobResourceContents { uri, mime_type, .. } => {
                ToolContent::Resource {
                    uri: uri.clone(),
                    mime_type: mime_type.clone(),
                    name: None,
                }
            }
        },
        RawContent::Audio(audio) => ToolContent::Text {
            text: format!("[Audio: {}]", audio.mime_type),
        },
        RawContent::ResourceLink(link) => ToolContent::Resource {
            uri: link.uri.clone(),
            mime_type: link.mime_type.clone(),
            name: Some(link.name.clone()),
        },
    }
}

pub fn from_rmcp_contents(contents: &[rmcp::model::Content]) -> Vec<ToolContent> {
    contents.iter().map(from_rmcp_content).collect()
}

pub fn to_call_output(result: &rmcp::model::CallToolResult) -> ToolCallOutput {
    let mut content = from_rmcp_contents(&result.content);
    if content.is_empty()
        && let Some(structured) = &result.structured_content
    {
        content.push(ToolContent::Text {
            text: structured.to_string(),
        });
    }
    ToolCallOutput {
        content,
        is_error: result.is_error.unwrap_or(false),
    }
}

pub fn to_descriptor(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor::new(
        tool.name.into_owned(),
        tool.description
            .map_or_else(String::new, std::borrow::Cow::into_owned),
        serde_json::Value::Object(tool.input_schema.as_ref().clone()),
    )
}
