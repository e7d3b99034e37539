//! Prelude module for convenient imports
//!
//! ```rust
//! use mailpilot::prelude::*;
//! ```

pub use crate::{
    ChatClient, ClientFactory, Content, EmailAssistant, EmailAssistantBuilder, EmailSender,
    GmailAuth, GmailAuthConfig, GmailClient, GraphConfig, LLMConfig, Message, OpenAIClient,
    OpenAIConfig, PersistenceBackends, PersistenceBuilder, StreamEvent, ToolErrorPolicy,
    ToolExecutor, ToolRegistry, TurnOutcome,
};
