//! Message model and chat client for the assistant's language model.
//!
//! [`ChatClient`] is the seam the turn loop calls; [`OpenAIClient`] implements it
//! against the chat-completions endpoint.

pub mod config;
pub mod openai;
pub mod traits;
pub mod types;

pub use config::{ClientFactory, OpenAIConfig};
pub use openai::OpenAIClient;
pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
pub use types::{Content, ContentPart, FunctionCall, FunctionDefinition, Message, Tool, ToolCall, ToolChoice};
