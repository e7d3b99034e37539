pub mod builder;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod router;
pub mod types;

pub use builder::GraphBuilder;
pub use graph::{Graph, PersistenceContext, TurnOutcome};
pub use node::{EventSender, Node, NodeType};
pub use nodes::{LLMNode, PersistNode, SystemPrompt, ToolNode};
pub use router::{NextNode, Router, SimpleRouter};
pub use types::{GraphConfig, GraphInput, GraphState, LLMConfig, StreamEvent, ToolErrorPolicy};
