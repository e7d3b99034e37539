pub mod config;
pub mod events;
pub mod state;

pub use config::{GraphConfig, LLMConfig, ToolErrorPolicy};
pub use events::StreamEvent;
pub use state::{GraphInput, GraphState};
