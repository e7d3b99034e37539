use anyhow::Result;
use async_trait::async_trait;
use crate::types::{GraphState, StreamEvent};
use tokio::sync::mpsc;

pub type EventSender = mpsc::Sender<StreamEvent>;

/// One step of a turn: call the model, run tools, or store the conversation
#[async_trait]
pub trait Node: Send + Sync {
    /// Advance the turn. Errors fail the whole turn.
    async fn execute(&self, state: &mut GraphState, event_tx: EventSender) -> Result<()>;

    fn node_type(&self) -> NodeType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    LLM,
    Tool,
    Persist,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::LLM => "llm",
            NodeType::Tool => "tool",
            NodeType::Persist => "persist",
        }
    }
}
