use crate::node::{EventSender, Node, NodeType};
use crate::types::{GraphState, StreamEvent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use mailpilot_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use mailpilot_tools::ToolExecutor;
use std::sync::Arc;

/// Produces the system instruction; called once per model request
pub type SystemPrompt = Arc<dyn Fn() -> String + Send + Sync>;

pub struct LLMNode {
    client: Arc<dyn ChatClient>,
    tools: Arc<dyn ToolExecutor>,
    system_prompt: Option<SystemPrompt>,
}

impl LLMNode {
    pub fn new(client: Arc<dyn ChatClient>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            client,
            tools,
            system_prompt: None,
        }
    }

    /// Instruction sent ahead of the conversation on every call; never stored in state
    pub fn with_system_prompt(mut self, prompt: SystemPrompt) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    fn build_request(&self, state: &GraphState) -> ChatRequest {
        let mut options = ChatOptions::new().with_tools(self.tools.llm_tools());
        if let Some(temp) = state.llm_config.temperature {
            options = options.with_temperature(temp);
        }
        if let Some(max_tokens) = state.llm_config.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt()));
        }
        messages.extend(state.messages.iter().cloned());

        ChatRequest::new(state.llm_config.model.clone(), messages).with_options(options)
    }
}

#[async_trait]
impl Node for LLMNode {
    async fn execute(&self, state: &mut GraphState, event_tx: EventSender) -> Result<()> {
        let request = self.build_request(state);

        tracing::info!(
            model = %state.llm_config.model,
            messages = request.messages.len(),
            "LLM_NODE: calling model"
        );

        let response = self
            .client
            .chat(request)
            .await
            .context("Model call failed")?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "LLM_NODE: token usage"
            );
        }

        let message = response.into_message()?;

        if let Some(text) = message.text() {
            event_tx
                .send(StreamEvent::Message {
                    content: text.to_string(),
                })
                .await?;
        }
        for call in message.tool_calls() {
            event_tx
                .send(StreamEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name().to_string(),
                    arguments: call.arguments().to_string(),
                })
                .await?;
        }

        state.add_message(message);
        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::LLM
    }
}
