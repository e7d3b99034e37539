use thiserror::Error;

use crate::gmail::GmailError;

/// Errors raised while dispatching or running a tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error(transparent)]
    Gmail(#[from] GmailError),
}

impl ToolError {
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}
