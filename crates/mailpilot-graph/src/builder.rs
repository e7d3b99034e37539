use std::sync::Arc;
use anyhow::{anyhow, Result};

use mailpilot_llm::ChatClient;
use mailpilot_persist::{Checkpointer, PersistenceClient};
use mailpilot_tools::ToolExecutor;

use crate::graph::Graph;
use crate::nodes::SystemPrompt;
use crate::types::GraphConfig;

/// Builder for constructing a Graph with optional components
#[derive(Default)]
pub struct GraphBuilder {
    chat_client: Option<Arc<dyn ChatClient>>,
    tools: Option<Arc<dyn ToolExecutor>>,
    config: GraphConfig,
    system_prompt: Option<SystemPrompt>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chat client
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    /// Set the tools the model may call
    pub fn tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the graph configuration
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixed system instruction
    pub fn system_prompt(self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt_with(move || prompt.clone())
    }

    /// System instruction rebuilt for every model request
    pub fn system_prompt_with(mut self, prompt: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.system_prompt = Some(Arc::new(prompt));
        self
    }

    /// Enable message persistence with a PersistenceClient
    pub fn with_persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    /// Carry messages between turns of the same thread
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Build the Graph
    pub fn build(self) -> Result<Graph> {
        let chat_client = self.chat_client.ok_or_else(|| anyhow!("Chat client is required"))?;
        let tools = self.tools.ok_or_else(|| anyhow!("Tool executor is required"))?;

        Ok(Graph::new_with_config(
            chat_client,
            tools,
            self.config,
            self.system_prompt,
            self.persistence,
            self.checkpointer,
        ))
    }
}
