use crate::node::NodeType;
use crate::types::GraphState;

/// Decides which node to execute next based on current state
pub trait Router: Send + Sync {
    /// First node of a turn
    fn entry(&self, state: &GraphState) -> NodeType;

    fn next(&self, state: &GraphState, current: NodeType) -> NextNode;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextNode {
    LLM,
    Tool,
    Persist,
    End,
}

/// Tool-call loop:
/// LLM -> Tool (if tool calls present) -> LLM -> Persist -> END
pub struct SimpleRouter;

impl Router for SimpleRouter {
    fn entry(&self, state: &GraphState) -> NodeType {
        // Nothing to send to the model
        if state.messages.is_empty() {
            NodeType::Persist
        } else {
            NodeType::LLM
        }
    }

    fn next(&self, state: &GraphState, current: NodeType) -> NextNode {
        match current {
            NodeType::LLM => {
                if state.has_pending_tool_calls() {
                    NextNode::Tool
                } else {
                    NextNode::Persist
                }
            }
            // Always return to LLM after executing tools
            NodeType::Tool => NextNode::LLM,
            NodeType::Persist => NextNode::End,
        }
    }
}
