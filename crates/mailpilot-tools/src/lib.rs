pub mod common;
pub mod error;
pub mod executor;
pub mod gmail;
pub mod send_email;

pub use common::{DoneTool, QuestionTool};
pub use error::ToolError;
pub use executor::{ToolExecutor, ToolHandler, ToolRegistry};
pub use gmail::{CredentialSource, GmailAuth, GmailAuthConfig, GmailClient, GmailError, OAuthToken};
pub use send_email::{EmailSender, SendEmailTool};

use std::sync::Arc;

/// Registry holding the assistant's tools: send email, ask a question, finish the turn
pub fn email_assistant_tools(sender: Arc<dyn EmailSender>) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(SendEmailTool::new(sender)))
        .with_tool(Arc::new(QuestionTool))
        .with_tool(Arc::new(DoneTool))
}
