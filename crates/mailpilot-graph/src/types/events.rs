use serde::{Deserialize, Serialize};

/// Events emitted while a turn runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Turn started
    InitStream {
        run_id: String,
        conversation_id: String,
        timestamp: i64,
    },

    /// Assistant text from a model call
    Message {
        content: String,
    },

    /// The model asked for a tool
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },

    /// Tool execution completed
    ToolResult {
        tool_call_id: String,
        result: String,
        is_error: bool,
        duration_ms: u64,
    },

    /// Message history stored
    Persisted {
        rows: usize,
    },

    /// Turn failed
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
    },

    /// Turn finished
    EndStream {
        status: String,
        total_duration_ms: u64,
    },
}
