use serde::{Deserialize, Serialize};

use super::content::Content;
use super::tool::ToolCall;

/// One entry of a conversation.
///
/// Serialized with a `role` tag using the stored role names
/// (`system`, `user`, `assistant`, `tool`), which is also how checkpoints keep it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: Content,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    #[serde(rename = "user")]
    Human {
        content: Content,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Model output. Either field may be absent, but a reply from the model has at least one.
    #[serde(rename = "assistant")]
    AI {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Content>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Result of one tool invocation, linked to it by `tool_call_id`
    Tool { tool_call_id: String, content: Content },
}

impl Message {
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System { content: content.into(), name: None }
    }

    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human { content: content.into(), name: None }
    }

    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: Some(content.into()),
            tool_calls: None,
            name: None,
        }
    }

    pub fn ai_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self::AI {
            content: None,
            tool_calls: Some(tool_calls),
            name: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Stored role name
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    pub fn content(&self) -> Option<&Content> {
        match self {
            Self::System { content, .. } | Self::Human { content, .. } | Self::Tool { content, .. } => Some(content),
            Self::AI { content, .. } => content.as_ref(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.content().and_then(Content::as_text)
    }

    /// Tool invocations declared by an assistant message; empty for every other role
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::AI { tool_calls: Some(calls), .. } => calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }
}
