mod llm_node;
mod persist_node;
mod tool_node;

pub use llm_node::{LLMNode, SystemPrompt};
pub use persist_node::PersistNode;
pub use tool_node::ToolNode;
