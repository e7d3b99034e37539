use crate::types::config::LLMConfig;
use mailpilot_llm::{Content, Message, ToolCall};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GraphState {
    pub conversation_id: String,
    pub run_id: String,
    pub messages: Vec<Message>,
    pub llm_config: LLMConfig,
    /// Set once the persistence node has stored the conversation
    pub persisted: bool,
}

impl GraphState {
    pub fn new(conversation_id: String, run_id: String, messages: Vec<Message>, llm_config: LLMConfig) -> Self {
        Self {
            conversation_id,
            run_id,
            messages,
            llm_config,
            persisted: false,
        }
    }

    /// State for a new run: prior thread history followed by this turn's input
    pub fn resume(input: GraphInput, history: Vec<Message>) -> Self {
        let mut messages = history;
        messages.extend(input.messages);
        Self::new(
            input.conversation_id,
            uuid::Uuid::new_v4().to_string(),
            messages,
            input.llm_config,
        )
    }

    pub fn from_input(input: GraphInput) -> Self {
        Self::resume(input, Vec::new())
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Whether the latest message is an assistant message declaring tool invocations
    pub fn has_pending_tool_calls(&self) -> bool {
        self.last_message().is_some_and(Message::has_tool_calls)
    }

    pub fn get_pending_tool_calls(&self) -> Vec<ToolCall> {
        self.last_message()
            .map(|msg| msg.tool_calls().to_vec())
            .unwrap_or_default()
    }

    pub fn add_tool_result(&mut self, tool_call_id: String, result: String) {
        self.messages.push(Message::Tool {
            tool_call_id,
            content: Content::text(result),
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInput {
    pub conversation_id: String,
    /// New messages for this turn, appended after any saved history
    pub messages: Vec<Message>,
    pub llm_config: LLMConfig,
}

impl GraphInput {
    pub fn new(conversation_id: impl Into<String>, messages: Vec<Message>, llm_config: LLMConfig) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages,
            llm_config,
        }
    }
}
