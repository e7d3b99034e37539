//! The email assistant application object
//!
//! `EmailAssistant` owns one turn graph with everything it needs wired in at
//! construction time: chat client, tools, storage backends and system prompt.
//! Nothing is read from the environment here; the CLI does that.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use mailpilot_graph::{Graph, GraphConfig, GraphInput, LLMConfig, PersistenceContext, StreamEvent, TurnOutcome};
use mailpilot_llm::{ChatClient, Message};
use mailpilot_persist::{InMemoryCheckpointer, PersistenceBackends};
use mailpilot_tools::{email_assistant_tools, EmailSender, ToolExecutor};

use crate::prompts;

/// A configured email assistant, ready to run turns
#[derive(Clone)]
pub struct EmailAssistant {
    graph: Graph,
    llm_config: LLMConfig,
    persistence_enabled: bool,
}

impl EmailAssistant {
    pub fn builder() -> EmailAssistantBuilder {
        EmailAssistantBuilder::new()
    }

    /// Whether finished turns are mirrored to the message store
    pub fn persistence_enabled(&self) -> bool {
        self.persistence_enabled
    }

    pub fn llm_config(&self) -> &LLMConfig {
        &self.llm_config
    }

    /// Run one turn for `thread_id` and wait for it to finish.
    ///
    /// Earlier turns on the same thread are loaded from the checkpointer, so
    /// calling this repeatedly with one thread id carries the conversation on.
    pub async fn run_turn(
        &self,
        thread_id: &str,
        user_id: &str,
        message: impl Into<String>,
    ) -> Result<TurnOutcome> {
        let (input, ctx) = self.turn_input(thread_id, user_id, message.into());
        tracing::info!(thread_id = %thread_id, user_id = %user_id, "Running turn");
        self.graph.invoke(input, Some(ctx)).await
    }

    /// Run one turn in the background and stream its events
    pub fn spawn_turn(
        &self,
        thread_id: &str,
        user_id: &str,
        message: impl Into<String>,
    ) -> mpsc::Receiver<StreamEvent> {
        let (input, ctx) = self.turn_input(thread_id, user_id, message.into());
        self.graph.spawn_run(input, Some(ctx))
    }

    fn turn_input(&self, thread_id: &str, user_id: &str, message: String) -> (GraphInput, PersistenceContext) {
        let input = GraphInput::new(thread_id, vec![Message::human(message)], self.llm_config.clone());
        (input, PersistenceContext::new(thread_id, user_id))
    }
}

/// Builder for [`EmailAssistant`]
///
/// A chat client is required, plus either a full tool executor or an email
/// sender (which gets the standard send/question/done tool set).
#[derive(Default)]
pub struct EmailAssistantBuilder {
    chat_client: Option<Arc<dyn ChatClient>>,
    tools: Option<Arc<dyn ToolExecutor>>,
    email_sender: Option<Arc<dyn EmailSender>>,
    backends: Option<PersistenceBackends>,
    graph_config: GraphConfig,
    llm_config: Option<LLMConfig>,
    system_prompt: Option<String>,
}

impl EmailAssistantBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    /// Use a custom tool executor instead of the standard tool set
    pub fn tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Build the standard tool set around this sender
    pub fn email_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email_sender = Some(sender);
        self
    }

    /// Storage backends. Without them turns are checkpointed in memory and not persisted.
    pub fn backends(mut self, backends: PersistenceBackends) -> Self {
        self.backends = Some(backends);
        self
    }

    pub fn graph_config(mut self, config: GraphConfig) -> Self {
        self.graph_config = config;
        self
    }

    pub fn llm_config(mut self, config: LLMConfig) -> Self {
        self.llm_config = Some(config);
        self
    }

    /// Override the default system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn build(self) -> Result<EmailAssistant> {
        let chat_client = self.chat_client.context("Chat client is required. Call .chat_client(client)")?;

        let tools: Arc<dyn ToolExecutor> = match (self.tools, self.email_sender) {
            (Some(tools), _) => tools,
            (None, Some(sender)) => Arc::new(email_assistant_tools(sender)),
            (None, None) => anyhow::bail!("Tools are required. Call .tools(executor) or .email_sender(sender)"),
        };

        let backends = self.backends.unwrap_or_else(|| PersistenceBackends {
            persistence: None,
            checkpointer: Arc::new(InMemoryCheckpointer::new()),
        });
        let persistence_enabled = backends.persistence.is_some();

        let mut builder = Graph::builder()
            .chat_client(chat_client)
            .tools(tools)
            .config(self.graph_config)
            .with_checkpointer(backends.checkpointer);
        // The default prompt carries today's date, so it is rebuilt per request
        builder = match self.system_prompt {
            Some(prompt) => builder.system_prompt(prompt),
            None => builder.system_prompt_with(prompts::system_prompt),
        };
        if let Some(persistence) = backends.persistence {
            builder = builder.with_persistence(persistence);
        }
        let graph = builder.build().context("Failed to build turn graph")?;

        Ok(EmailAssistant {
            graph,
            llm_config: self.llm_config.unwrap_or_default(),
            persistence_enabled,
        })
    }
}
