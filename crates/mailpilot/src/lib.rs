//! # Mailpilot
//!
//! Conversational email assistant: an LLM with tools that can send Gmail
//! messages, with per-thread memory and optional Postgres message history.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailpilot::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let chat_client = ClientFactory::create_chat_client(OpenAIConfig::new(
//!         std::env::var("OPENAI_API_KEY")?,
//!     ))?;
//!
//!     let auth = Arc::new(GmailAuth::new(GmailAuthConfig::new()));
//!     let gmail = Arc::new(GmailClient::new(auth));
//!
//!     let backends = PersistenceBuilder::new()
//!         .maybe_database_url(std::env::var("DATABASE_URL").ok())
//!         .build()?;
//!
//!     let assistant = EmailAssistant::builder()
//!         .chat_client(chat_client)
//!         .email_sender(gmail)
//!         .backends(backends)
//!         .build()?;
//!
//!     let outcome = assistant
//!         .run_turn("default-thread", "default-user", "Hello, how are you?")
//!         .await?;
//!     println!("{}", outcome.final_text().unwrap_or("(no response)"));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`mailpilot-llm`**: message model and OpenAI chat client
//! - **`mailpilot-tools`**: tool registry, assistant tools, Gmail auth and send
//! - **`mailpilot-persist`**: conversation identity, message sync, checkpoints
//! - **`mailpilot-graph`**: the turn loop (model, tools, persist)

pub mod assistant;
pub mod prelude;
pub mod prompts;

pub use assistant::{EmailAssistant, EmailAssistantBuilder};

pub use mailpilot_graph::{
    Graph, GraphBuilder, GraphConfig, GraphInput, GraphState, LLMConfig, PersistenceContext,
    StreamEvent, ToolErrorPolicy, TurnOutcome,
};

pub use mailpilot_llm::{
    ChatClient, ChatOptions, ChatRequest, ChatResponse, ClientFactory, Content, Message,
    OpenAIClient, OpenAIConfig, Tool, ToolCall, ToolChoice,
};

pub use mailpilot_tools::{
    email_assistant_tools, CredentialSource, EmailSender, GmailAuth, GmailAuthConfig, GmailClient,
    GmailError, ToolError, ToolExecutor, ToolHandler, ToolRegistry,
};

pub use mailpilot_persist::{
    Checkpointer, InMemoryCheckpointer, InMemoryPersistenceClient, PersistError,
    PersistenceBackends, PersistenceBuilder, PersistenceClient,
};

#[cfg(feature = "postgres")]
pub use mailpilot_persist::{PostgresCheckpointer, PostgresPersistenceClient};
