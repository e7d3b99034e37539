use async_trait::async_trait;
use mailpilot_llm::Tool;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ToolError;
use crate::executor::{parse_arguments, ToolHandler};
use crate::gmail::GmailError;

/// Anything that can deliver a new plain-text email
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a new message and return the provider's message id
    async fn send_new_email(&self, to: &str, subject: &str, body: &str) -> Result<String, GmailError>;
}

/// `send_email_tool`: sends a new email through an [`EmailSender`]
pub struct SendEmailTool {
    sender: Arc<dyn EmailSender>,
}

#[derive(Debug, Deserialize)]
struct SendEmailArgs {
    email_address: String,
    subject: String,
    body: String,
    #[serde(default)]
    email_id: Option<String>,
}

impl SendEmailTool {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ToolHandler for SendEmailTool {
    fn name(&self) -> &str {
        "send_email_tool"
    }

    fn definition(&self) -> Tool {
        Tool::new(
            self.name(),
            "Send an email. Use for NEW emails: provide email_address (recipient), subject, and body. \
             Only provide email_id when replying to an existing email.",
            json!({
                "type": "object",
                "properties": {
                    "email_address": {
                        "type": "string",
                        "description": "Recipient email address"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Subject line"
                    },
                    "body": {
                        "type": "string",
                        "description": "Plain-text body"
                    },
                    "email_id": {
                        "type": "string",
                        "description": "Id of an existing email to reply to"
                    }
                },
                "required": ["email_address", "subject", "body"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: SendEmailArgs = parse_arguments(self.name(), arguments)?;

        if let Some(email_id) = args.email_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            tracing::warn!(email_id = %email_id, "Reply by email id requested");
            return Err(ToolError::NotImplemented(format!(
                "replying to email '{}' is not supported yet; send a new email without email_id",
                email_id
            )));
        }

        let message_id = self
            .sender
            .send_new_email(&args.email_address, &args.subject, &args.body)
            .await?;

        tracing::info!(to = %args.email_address, message_id = %message_id, "Email sent");
        Ok(format!(
            "Email sent to {} (message id: {}).",
            args.email_address, message_id
        ))
    }
}
