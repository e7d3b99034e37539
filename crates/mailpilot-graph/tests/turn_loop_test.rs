use anyhow::Result;
use async_trait::async_trait;
use mailpilot_graph::{
    Graph, GraphConfig, GraphInput, LLMConfig, PersistenceContext, StreamEvent, ToolErrorPolicy,
};
use mailpilot_llm::{ChatClient, ChatRequest, ChatResponse, Message, ToolCall};
use mailpilot_persist::{
    conversation_id_for, Checkpointer, ConversationKey, InMemoryCheckpointer,
    InMemoryPersistenceClient, PersistError, PersistenceClient, StoredMessage,
};
use mailpilot_tools::{email_assistant_tools, EmailSender, GmailError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Chat client that replays canned responses and records every request
#[derive(Default)]
struct ScriptedChatClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatClient {
    fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send_new_email(&self, to: &str, subject: &str, body: &str) -> Result<String, GmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok("msg-001".to_string())
    }
}

struct BrokenStorage;

#[async_trait]
impl PersistenceClient for BrokenStorage {
    async fn replace_messages(&self, _: &ConversationKey, _: &[StoredMessage]) -> mailpilot_persist::Result<()> {
        Err(PersistError::Connection("connection refused".to_string()))
    }

    async fn load_messages(&self, _: Uuid) -> mailpilot_persist::Result<Vec<StoredMessage>> {
        Err(PersistError::Connection("connection refused".to_string()))
    }
}

struct Harness {
    graph: Graph,
    client: Arc<ScriptedChatClient>,
    sender: Arc<RecordingSender>,
    storage: Arc<InMemoryPersistenceClient>,
}

fn harness(responses: Vec<ChatResponse>, config: GraphConfig) -> Harness {
    let client = ScriptedChatClient::new(responses);
    let sender = Arc::new(RecordingSender::default());
    let storage = Arc::new(InMemoryPersistenceClient::new());

    let graph = Graph::builder()
        .chat_client(client.clone())
        .tools(Arc::new(email_assistant_tools(sender.clone())))
        .config(config)
        .system_prompt("You are an email assistant.")
        .with_persistence(storage.clone())
        .with_checkpointer(Arc::new(InMemoryCheckpointer::new()))
        .build()
        .unwrap();

    Harness {
        graph,
        client,
        sender,
        storage,
    }
}

fn input(thread_id: &str, text: &str) -> GraphInput {
    GraphInput::new(thread_id, vec![Message::human(text)], LLMConfig::default())
}

fn ctx(thread_id: &str) -> Option<PersistenceContext> {
    Some(PersistenceContext::new(thread_id, "default-user"))
}

fn tool_call(id: &str, name: &str, args: &str) -> ChatResponse {
    ChatResponse::with_tool_calls(vec![ToolCall::new(id, name, args)])
}

#[tokio::test]
async fn test_plain_answer_ends_turn() {
    let h = harness(vec![ChatResponse::text("I'm well, thanks!")], GraphConfig::default());

    let outcome = h
        .graph
        .invoke(input("t-hello", "Hello, how are you?"), ctx("t-hello"))
        .await
        .unwrap();

    assert_eq!(outcome.final_message(), Some(&Message::ai("I'm well, thanks!")));
    assert_eq!(outcome.messages.len(), 2);
    assert!(outcome.persisted);
    assert_eq!(h.client.requests().len(), 1);
    assert!(h.sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_system_prompt_is_sent_but_not_stored() {
    let h = harness(vec![ChatResponse::text("Hi")], GraphConfig::default());

    let outcome = h.graph.invoke(input("t-sys", "Hello"), ctx("t-sys")).await.unwrap();

    let request = &h.client.requests()[0];
    assert_eq!(request.messages[0], Message::system("You are an email assistant."));
    assert_eq!(request.messages[1], Message::human("Hello"));
    assert!(request.options.tools.as_ref().is_some_and(|t| t.len() == 3));

    assert!(outcome.messages.iter().all(|m| m.role() != "system"));
    let stored = h.storage.load_messages(conversation_id_for("t-sys")).await.unwrap();
    assert!(stored.iter().all(|m| m.role != "system"));
}

#[tokio::test]
async fn test_send_email_then_done() {
    let h = harness(
        vec![
            tool_call(
                "call_1",
                "send_email_tool",
                r#"{"email_address":"alice@example.com","subject":"Hi","body":"Hello"}"#,
            ),
            tool_call("call_2", "done_tool", r#"{"summary":"Emailed Alice."}"#),
            ChatResponse::text("I sent the email to Alice."),
        ],
        GraphConfig::default(),
    );

    let outcome = h
        .graph
        .invoke(
            input("t-email", "email alice@example.com with subject Hi and body Hello"),
            ctx("t-email"),
        )
        .await
        .unwrap();

    assert_eq!(
        *h.sender.sent.lock().unwrap(),
        vec![("alice@example.com".to_string(), "Hi".to_string(), "Hello".to_string())]
    );

    let roles: Vec<&str> = outcome.messages.iter().map(Message::role).collect();
    assert_eq!(roles, vec!["user", "assistant", "tool", "assistant", "tool", "assistant"]);
    assert_eq!(
        outcome.messages[2],
        Message::tool_result("call_1", "Email sent to alice@example.com (message id: msg-001).")
    );
    assert_eq!(outcome.messages[4], Message::tool_result("call_2", "Done. Emailed Alice."));
    assert_eq!(outcome.final_text(), Some("I sent the email to Alice."));

    // The tool result is visible to the next model call
    let second = &h.client.requests()[1];
    assert_eq!(second.messages.last(), Some(&outcome.messages[2]));

    let stored = h.storage.load_messages(conversation_id_for("t-email")).await.unwrap();
    assert_eq!(stored.len(), 6);
    assert_eq!(stored[1].metadata["tool_calls"][0]["function"]["name"], "send_email_tool");
    assert_eq!(stored[2].metadata["tool_call_id"], "call_1");
}

#[tokio::test]
async fn test_each_tool_call_dispatched_once_in_order() {
    let h = harness(
        vec![
            ChatResponse::with_tool_calls(vec![
                ToolCall::new("a", "question_tool", r#"{"message":"Which Alice?"}"#),
                ToolCall::new("b", "done_tool", "{}"),
            ]),
            ChatResponse::text("Waiting for your answer."),
        ],
        GraphConfig::default(),
    );

    let outcome = h.graph.invoke(input("t-multi", "email alice"), None).await.unwrap();

    assert_eq!(outcome.messages[2], Message::tool_result("a", "[Question for user: Which Alice?]"));
    assert_eq!(outcome.messages[3], Message::tool_result("b", "Done."));
    assert_eq!(h.client.requests().len(), 2);
}

#[tokio::test]
async fn test_reply_by_id_fails_turn_without_sending() {
    let h = harness(
        vec![tool_call(
            "call_1",
            "send_email_tool",
            r#"{"email_address":"alice@example.com","subject":"Re: Hi","body":"Thanks","email_id":"18c2f0"}"#,
        )],
        GraphConfig::default(),
    );

    let err = h
        .graph
        .invoke(input("t-reply", "reply to that email"), ctx("t-reply"))
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Not implemented"), "unexpected error: {:#}", err);
    assert!(h.sender.sent.lock().unwrap().is_empty());
    assert_eq!(h.storage.operation_count(), 0);
}

#[tokio::test]
async fn test_empty_model_reply_fails_turn_and_is_not_kept() {
    let mut empty = ChatResponse::text("");
    empty.content = None;
    let h = harness(vec![empty, ChatResponse::text("Hello!")], GraphConfig::default());

    let err = h.graph.invoke(input("t-empty-reply", "hi"), ctx("t-empty-reply")).await.unwrap_err();
    assert!(
        format!("{:#}", err).contains("neither text nor tool calls"),
        "unexpected error: {:#}",
        err
    );
    assert_eq!(h.storage.operation_count(), 0);

    let outcome = h
        .graph
        .invoke(input("t-empty-reply", "hi again"), ctx("t-empty-reply"))
        .await
        .unwrap();

    // The failed turn left nothing behind: system prompt + the new question only
    let retry = &h.client.requests()[1];
    assert_eq!(retry.messages.len(), 2);
    assert!(retry
        .messages
        .iter()
        .all(|m| !matches!(m, Message::AI { content: None, tool_calls: None, .. })));
    assert_eq!(outcome.final_text(), Some("Hello!"));
}

#[tokio::test]
async fn test_system_prompt_is_rebuilt_for_every_request() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let client = ScriptedChatClient::new(vec![
        tool_call("call_1", "done_tool", "{}"),
        ChatResponse::text("Done."),
    ]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let graph = Graph::builder()
        .chat_client(client.clone())
        .tools(Arc::new(email_assistant_tools(Arc::new(RecordingSender::default()))))
        .system_prompt_with(move || format!("prompt #{}", counter.fetch_add(1, Ordering::SeqCst) + 1))
        .build()
        .unwrap();

    graph.invoke(input("t-prompt", "finish"), None).await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages[0], Message::system("prompt #1"));
    assert_eq!(requests[1].messages[0], Message::system("prompt #2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_report_to_model_policy_continues() {
    let h = harness(
        vec![
            tool_call("call_1", "calendar_tool", "{}"),
            ChatResponse::text("I can't do that."),
        ],
        GraphConfig::default().with_tool_error_policy(ToolErrorPolicy::ReportToModel),
    );

    let outcome = h.graph.invoke(input("t-report", "book a meeting"), None).await.unwrap();

    match &outcome.messages[2] {
        Message::Tool { tool_call_id, .. } => assert_eq!(tool_call_id, "call_1"),
        other => panic!("expected tool result, got {:?}", other),
    }
    assert!(outcome.messages[2].text().unwrap().contains("not found"));
    assert_eq!(outcome.final_text(), Some("I can't do that."));
}

#[tokio::test]
async fn test_empty_input_skips_model_and_storage() {
    let h = harness(vec![], GraphConfig::default());

    let outcome = h
        .graph
        .invoke(GraphInput::new("t-empty", vec![], LLMConfig::default()), ctx("t-empty"))
        .await
        .unwrap();

    assert!(outcome.messages.is_empty());
    assert!(!outcome.persisted);
    assert!(h.client.requests().is_empty());
    assert_eq!(h.storage.operation_count(), 0);
}

#[tokio::test]
async fn test_max_iterations_fails_turn() {
    let looping: Vec<ChatResponse> = (0..10)
        .map(|i| tool_call(&format!("call_{}", i), "done_tool", "{}"))
        .collect();
    let h = harness(looping, GraphConfig::default().with_max_iterations(4));

    let err = h.graph.invoke(input("t-loop", "go"), ctx("t-loop")).await.unwrap_err();

    assert!(err.to_string().contains("Max iterations (4) reached"));
    assert_eq!(h.storage.operation_count(), 0);
}

#[tokio::test]
async fn test_storage_failure_does_not_fail_turn() {
    let client = ScriptedChatClient::new(vec![ChatResponse::text("Still here.")]);
    let graph = Graph::builder()
        .chat_client(client)
        .tools(Arc::new(email_assistant_tools(Arc::new(RecordingSender::default()))))
        .with_persistence(Arc::new(BrokenStorage))
        .build()
        .unwrap();

    let outcome = graph.invoke(input("t-broken", "Hello"), ctx("t-broken")).await.unwrap();

    assert_eq!(outcome.final_text(), Some("Still here."));
    assert!(!outcome.persisted);
}

#[tokio::test]
async fn test_no_persistence_still_answers() {
    let client = ScriptedChatClient::new(vec![ChatResponse::text("Hello!")]);
    let graph = Graph::builder()
        .chat_client(client)
        .tools(Arc::new(email_assistant_tools(Arc::new(RecordingSender::default()))))
        .build()
        .unwrap();

    let outcome = graph.invoke(input("t-none", "Hi"), ctx("t-none")).await.unwrap();

    assert_eq!(outcome.final_text(), Some("Hello!"));
    assert!(!outcome.persisted);
}

#[tokio::test]
async fn test_second_turn_sees_first_turn() {
    let h = harness(
        vec![ChatResponse::text("Hi Bob."), ChatResponse::text("Your name is Bob.")],
        GraphConfig::default(),
    );

    h.graph.invoke(input("t-multi-turn", "I'm Bob"), ctx("t-multi-turn")).await.unwrap();
    let outcome = h
        .graph
        .invoke(input("t-multi-turn", "What's my name?"), ctx("t-multi-turn"))
        .await
        .unwrap();

    assert_eq!(outcome.messages.len(), 4);
    let second_request = &h.client.requests()[1];
    // system prompt + 3 conversation messages
    assert_eq!(second_request.messages.len(), 4);
    assert_eq!(second_request.messages[1], Message::human("I'm Bob"));

    let stored = h.storage.load_messages(conversation_id_for("t-multi-turn")).await.unwrap();
    assert_eq!(stored.len(), 4);
}

#[tokio::test]
async fn test_threads_do_not_share_history() {
    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let client = ScriptedChatClient::new(vec![ChatResponse::text("one"), ChatResponse::text("two")]);
    let graph = Graph::builder()
        .chat_client(client)
        .tools(Arc::new(email_assistant_tools(Arc::new(RecordingSender::default()))))
        .with_checkpointer(checkpointer.clone())
        .build()
        .unwrap();

    graph.invoke(input("a", "first"), None).await.unwrap();
    let outcome = graph.invoke(input("b", "second"), None).await.unwrap();

    assert_eq!(outcome.messages.len(), 2);
    assert_eq!(checkpointer.load("a").await.unwrap().unwrap().len(), 2);
}

#[tokio::test]
async fn test_spawn_run_streams_events() {
    let h = harness(
        vec![
            tool_call("call_1", "done_tool", "{}"),
            ChatResponse::text("All done."),
        ],
        GraphConfig::default(),
    );

    let mut rx = h.graph.spawn_run(input("t-stream", "finish"), ctx("t-stream"));
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(StreamEvent::InitStream { .. })));
    assert!(events.iter().any(|e| matches!(e, StreamEvent::ToolCall { name, .. } if name == "done_tool")));
    assert!(events.iter().any(|e| matches!(
        e,
        StreamEvent::ToolResult { result, is_error: false, .. } if result == "Done."
    )));
    assert!(events.iter().any(|e| matches!(e, StreamEvent::Persisted { rows: 4 })));
    assert!(matches!(events.last(), Some(StreamEvent::EndStream { status, .. }) if status == "success"));
}

#[tokio::test]
async fn test_spawn_run_reports_failure_as_event() {
    let h = harness(vec![], GraphConfig::default());

    let mut rx = h.graph.spawn_run(input("t-fail", "hello"), None);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    match events.last() {
        Some(StreamEvent::Error { message, .. }) => assert!(message.contains("script exhausted")),
        other => panic!("expected error event, got {:?}", other),
    }
}
