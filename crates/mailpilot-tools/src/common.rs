//! Pure tools that let the model talk about the turn itself: ask the user something, or say it is finished.

use async_trait::async_trait;
use mailpilot_llm::Tool;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::executor::{parse_arguments, ToolHandler};

pub struct QuestionTool;

#[derive(Deserialize)]
struct QuestionArgs {
    message: String,
}

#[async_trait]
impl ToolHandler for QuestionTool {
    fn name(&self) -> &str {
        "question_tool"
    }

    fn definition(&self) -> Tool {
        Tool::new(
            self.name(),
            "Ask the user a question or request clarification. Use when you need more information \
             (e.g. missing recipient, unclear subject) before proceeding.",
            json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The question to ask the user"
                    }
                },
                "required": ["message"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: QuestionArgs = parse_arguments(self.name(), arguments)?;
        Ok(format!("[Question for user: {}]", args.message))
    }
}

pub struct DoneTool;

#[derive(Deserialize)]
struct DoneArgs {
    #[serde(default)]
    summary: Option<String>,
}

#[async_trait]
impl ToolHandler for DoneTool {
    fn name(&self) -> &str {
        "done_tool"
    }

    fn definition(&self) -> Tool {
        Tool::new(
            self.name(),
            "Signal that you are done with this turn. Use after sending an email or completing \
             the user's request. Optionally provide a short summary of what was done.",
            json!({
                "type": "object",
                "properties": {
                    "summary": {
                        "type": "string",
                        "description": "Short summary of what was done"
                    }
                }
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: DoneArgs = parse_arguments(self.name(), arguments)?;
        Ok(match args.summary.as_deref() {
            Some(summary) if !summary.is_empty() => format!("Done. {}", summary),
            _ => "Done.".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_question_echoes_message() {
        let out = QuestionTool
            .call(json!({"message": "What subject should I use?"}))
            .await
            .unwrap();
        assert_eq!(out, "[Question for user: What subject should I use?]");
    }

    #[tokio::test]
    async fn test_question_requires_message() {
        let err = QuestionTool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_done_without_summary() {
        assert_eq!(DoneTool.call(json!({})).await.unwrap(), "Done.");
        assert_eq!(DoneTool.call(json!({"summary": ""})).await.unwrap(), "Done.");
    }

    #[tokio::test]
    async fn test_done_with_summary() {
        let out = DoneTool
            .call(json!({"summary": "Sent the email to Alice."}))
            .await
            .unwrap();
        assert_eq!(out, "Done. Sent the email to Alice.");
    }
}
