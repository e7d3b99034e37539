use crate::types::{Message, Tool, ToolCall, ToolChoice, Content};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat-completion backend.
///
/// One request in, one assistant reply out; tool calls ride on the reply.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// Sampling and tool settings for one request. Unset fields are left to the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Offer tools to the model and let it decide when to call them.
    ///
    /// An empty list leaves the request tool-free.
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        if tools.is_empty() {
            self.tools = None;
            self.tool_choice = None;
        } else {
            self.tools = Some(tools);
            self.tool_choice.get_or_insert(ToolChoice::Auto);
        }
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub raw: serde_json::Value,
}

impl ChatResponse {
    /// Response with text only; handy for scripted clients
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: None,
            usage: None,
            finish_reason: Some("stop".to_string()),
            raw: serde_json::Value::Null,
        }
    }

    /// Response carrying tool calls and no text
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls: Some(tool_calls),
            usage: None,
            finish_reason: Some("tool_calls".to_string()),
            raw: serde_json::Value::Null,
        }
    }

    /// Convert into the assistant message appended to the conversation.
    ///
    /// Empty text next to tool calls collapses to `None`; a reply with only
    /// empty text keeps it. A reply with neither text nor tool calls is an error.
    pub fn into_message(self) -> Result<Message> {
        let tool_calls = self.tool_calls.filter(|calls| !calls.is_empty());
        let content = match (self.content, &tool_calls) {
            (Some(text), Some(_)) if text.is_empty() => None,
            (content, _) => content.map(Content::Text),
        };
        if content.is_none() && tool_calls.is_none() {
            anyhow::bail!("Model reply carried neither text nor tool calls");
        }
        Ok(Message::AI {
            content,
            tool_calls,
            name: None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
