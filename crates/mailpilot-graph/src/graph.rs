use crate::node::{Node, NodeType};
use crate::nodes::{LLMNode, PersistNode, SystemPrompt, ToolNode};
use crate::router::{NextNode, Router, SimpleRouter};
use crate::types::{GraphConfig, GraphInput, GraphState, StreamEvent};
use anyhow::{Context, Result};
use mailpilot_llm::{ChatClient, Message};
use mailpilot_persist::{Checkpointer, PersistenceClient};
use mailpilot_tools::ToolExecutor;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Context for persistence operations
#[derive(Debug, Clone)]
pub struct PersistenceContext {
    pub thread_id: String,
    pub user_id: String,
}

impl PersistenceContext {
    pub fn new(thread_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Result of one completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub run_id: String,
    pub conversation_id: String,
    /// Full conversation after the turn, history included
    pub messages: Vec<Message>,
    pub persisted: bool,
    pub events: Vec<StreamEvent>,
}

impl TurnOutcome {
    /// The assistant's last message of the turn
    pub fn final_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| matches!(m, Message::AI { .. }))
    }

    pub fn final_text(&self) -> Option<&str> {
        self.final_message().and_then(Message::text)
    }
}

#[derive(Clone)]
pub struct Graph {
    chat_client: Arc<dyn ChatClient>,
    tools: Arc<dyn ToolExecutor>,
    config: GraphConfig,
    system_prompt: Option<SystemPrompt>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl Graph {
    pub fn new(chat_client: Arc<dyn ChatClient>, tools: Arc<dyn ToolExecutor>, config: GraphConfig) -> Self {
        Self {
            chat_client,
            tools,
            config,
            system_prompt: None,
            persistence: None,
            checkpointer: None,
        }
    }

    pub(crate) fn new_with_config(
        chat_client: Arc<dyn ChatClient>,
        tools: Arc<dyn ToolExecutor>,
        config: GraphConfig,
        system_prompt: Option<SystemPrompt>,
        persistence: Option<Arc<dyn PersistenceClient>>,
        checkpointer: Option<Arc<dyn Checkpointer>>,
    ) -> Self {
        Self {
            chat_client,
            tools,
            config,
            system_prompt,
            persistence,
            checkpointer,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::GraphBuilder {
        crate::builder::GraphBuilder::new()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Spawn execution in background, return event receiver
    pub fn spawn_run(&self, input: GraphInput, persistence_ctx: Option<PersistenceContext>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let graph = self.clone();

        tokio::spawn(async move {
            if let Err(e) = graph.execute_loop(input, tx.clone(), persistence_ctx).await {
                tracing::error!(error = %format!("{:#}", e), "Turn failed");
                let _ = tx
                    .send(StreamEvent::Error {
                        message: format!("{:#}", e),
                        node_id: None,
                    })
                    .await;
            }
        });

        rx
    }

    /// Run one turn to completion and return the resulting conversation
    pub async fn invoke(&self, input: GraphInput, persistence_ctx: Option<PersistenceContext>) -> Result<TurnOutcome> {
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let run = self.execute_loop(input, tx, persistence_ctx);
        let collect = async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            events
        };

        let (result, events) = tokio::join!(run, collect);
        let mut outcome = result?;
        outcome.events = events;
        Ok(outcome)
    }

    async fn execute_loop(
        &self,
        input: GraphInput,
        event_tx: mpsc::Sender<StreamEvent>,
        ctx: Option<PersistenceContext>,
    ) -> Result<TurnOutcome> {
        let start_time = Instant::now();

        // Prior history for this thread
        let history = match &self.checkpointer {
            Some(checkpointer) => checkpointer
                .load(&input.conversation_id)
                .await
                .with_context(|| format!("Failed to load checkpoint for thread '{}'", input.conversation_id))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let mut state = GraphState::resume(input, history);

        tracing::info!(
            run_id = %state.run_id,
            conversation_id = %state.conversation_id,
            messages = state.messages.len(),
            "Turn started"
        );

        event_tx
            .send(StreamEvent::InitStream {
                run_id: state.run_id.clone(),
                conversation_id: state.conversation_id.clone(),
                timestamp: chrono::Utc::now().timestamp_millis(),
            })
            .await?;

        // Create nodes
        let mut llm_node = LLMNode::new(Arc::clone(&self.chat_client), Arc::clone(&self.tools));
        if let Some(prompt) = &self.system_prompt {
            llm_node = llm_node.with_system_prompt(Arc::clone(prompt));
        }
        let tool_node = ToolNode::new(Arc::clone(&self.tools)).with_error_policy(self.config.tool_error_policy);
        let persist_node = match &ctx {
            Some(ctx) => PersistNode::new(self.persistence.clone(), ctx.thread_id.clone(), ctx.user_id.clone()),
            None => PersistNode::disabled(),
        };
        let router = SimpleRouter;

        let mut current_node = router.entry(&state);
        let mut iteration = 0;

        loop {
            // Guardrail: max iterations
            if iteration >= self.config.max_iterations {
                anyhow::bail!("Max iterations ({}) reached", self.config.max_iterations);
            }

            let node: &dyn Node = match current_node {
                NodeType::LLM => &llm_node,
                NodeType::Tool => &tool_node,
                NodeType::Persist => &persist_node,
            };

            let node_start = Instant::now();
            node.execute(&mut state, event_tx.clone())
                .await
                .with_context(|| format!("{} node failed", node.node_type().as_str()))?;
            tracing::debug!(
                node = node.node_type().as_str(),
                duration_ms = node_start.elapsed().as_millis() as u64,
                "Node finished"
            );

            // Route to next node
            match router.next(&state, current_node) {
                NextNode::End => break,
                NextNode::LLM => current_node = NodeType::LLM,
                NextNode::Tool => current_node = NodeType::Tool,
                NextNode::Persist => current_node = NodeType::Persist,
            }

            iteration += 1;
        }

        // Saving the checkpoint is best-effort, like persistence
        if let Some(checkpointer) = &self.checkpointer {
            if let Err(e) = checkpointer.save(&state.conversation_id, &state.messages).await {
                tracing::warn!(
                    conversation_id = %state.conversation_id,
                    error = %e,
                    "Failed to save checkpoint"
                );
            }
        }

        let total_duration = start_time.elapsed().as_millis() as u64;
        event_tx
            .send(StreamEvent::EndStream {
                status: "success".to_string(),
                total_duration_ms: total_duration,
            })
            .await?;

        tracing::info!(run_id = %state.run_id, duration_ms = total_duration, "Turn finished");

        Ok(TurnOutcome {
            run_id: state.run_id,
            conversation_id: state.conversation_id,
            messages: state.messages,
            persisted: state.persisted,
            events: Vec::new(),
        })
    }
}
