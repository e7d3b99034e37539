use anyhow::Result;
use async_trait::async_trait;
use config::Map;
use mailpilot::{
    ChatClient, ChatRequest, ChatResponse, EmailAssistant, EmailSender, GmailError, ToolCall,
};
use mailpilot_cli::{build_assistant, config::Config, session};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct ScriptedChatClient {
    responses: Mutex<VecDeque<ChatResponse>>,
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }
}

struct NoopSender;

#[async_trait]
impl EmailSender for NoopSender {
    async fn send_new_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<String, GmailError> {
        Ok("msg-1".to_string())
    }
}

fn assistant(responses: Vec<ChatResponse>) -> EmailAssistant {
    EmailAssistant::builder()
        .chat_client(Arc::new(ScriptedChatClient {
            responses: Mutex::new(responses.into()),
        }))
        .email_sender(Arc::new(NoopSender))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_single_turn_prints_tools_and_reply() {
    let assistant = assistant(vec![
        ChatResponse::with_tool_calls(vec![ToolCall::new(
            "call_1",
            "send_email_tool",
            r#"{"email_address":"bob@example.com","subject":"Hi","body":"Hello"}"#,
        )]),
        ChatResponse::text("Sent."),
    ]);

    let mut out = Vec::new();
    let reply = session::run_turn(&assistant, "t", "u", "email bob", &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert_eq!(reply, "Sent.");
    assert!(printed.contains("-> send_email_tool("));
    assert!(printed.contains("<- Email sent to bob@example.com (message id: msg-1)."));
    assert!(printed.ends_with("Sent.\n"));
}

#[tokio::test]
async fn test_reply_is_the_final_message_not_earlier_text() {
    let mut wrap_up = ChatResponse::with_tool_calls(vec![ToolCall::new("call_1", "done_tool", "{}")]);
    wrap_up.content = Some("Let me wrap this up.".to_string());
    let assistant = assistant(vec![wrap_up, ChatResponse::text("")]);

    let mut out = Vec::new();
    let reply = session::run_turn(&assistant, "t", "u", "thanks", &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert_eq!(reply, "");
    assert!(printed.contains("-> done_tool({})"));
    assert!(printed.ends_with("<- Done.\n\n"), "unexpected output: {:?}", printed);
}

#[tokio::test]
async fn test_failed_turn_is_an_error() {
    let assistant = assistant(vec![ChatResponse::with_tool_calls(vec![ToolCall::new(
        "call_1",
        "send_email_tool",
        r#"{"email_address":"bob@example.com","subject":"Re","body":"ok","email_id":"abc"}"#,
    )])]);

    let mut out = Vec::new();
    let err = session::run_turn(&assistant, "t", "u", "reply to abc", &mut out).await.unwrap_err();
    assert!(err.to_string().contains("Not implemented"));
}

#[tokio::test]
async fn test_interactive_stops_at_exit() {
    let assistant = assistant(vec![
        ChatResponse::text("Hi there."),
        ChatResponse::text("Still here."),
        ChatResponse::text("never used"),
    ]);
    let input = tokio::io::BufReader::new(&b"hello\n\n  \nare you there?\nexit\nignored\n"[..]);

    let mut out = Vec::new();
    let turns = session::interactive(&assistant, "t", "u", input, &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert_eq!(turns, 2);
    assert!(printed.contains("Hi there."));
    assert!(printed.contains("Still here."));
    assert!(!printed.contains("never used"));
}

#[tokio::test]
async fn test_interactive_survives_failed_turn_and_ends_at_eof() {
    // Script runs dry on the second line
    let assistant = assistant(vec![ChatResponse::text("First.")]);
    let input = tokio::io::BufReader::new(&b"one\ntwo\n"[..]);

    let mut out = Vec::new();
    let turns = session::interactive(&assistant, "t", "u", input, &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert_eq!(turns, 1);
    assert!(printed.contains("error: "));
    assert!(printed.contains("script exhausted"));
}

#[test]
fn test_build_assistant_without_database() {
    let dir = tempfile::tempdir().unwrap();
    let vars: Map<String, String> = [("OPENAI_API_KEY".to_string(), "sk-test".to_string())]
        .into_iter()
        .collect();
    let config = Config::load_from(dir.path(), &vars).unwrap();

    let assistant = build_assistant(&config).unwrap();
    assert!(!assistant.persistence_enabled());
    assert_eq!(assistant.llm_config().model, "gpt-4o");
}
