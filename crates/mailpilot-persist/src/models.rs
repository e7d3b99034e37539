use mailpilot_llm::{Content, Message, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PersistError, Result};

/// One row of the stored message history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub position: i32,
    pub role: String,
    pub content: Option<String>,
    pub metadata: Value,
}

impl StoredMessage {
    /// Flatten a conversation message into its stored shape
    pub fn from_message(position: i32, message: &Message) -> Result<Self> {
        let mut metadata = Map::new();

        match message {
            Message::System { name, .. } | Message::Human { name, .. } => {
                if let Some(name) = name {
                    metadata.insert("name".to_string(), Value::from(name.as_str()));
                }
            }
            Message::AI { tool_calls, name, .. } => {
                if let Some(calls) = tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
                    metadata.insert("tool_calls".to_string(), serde_json::to_value(calls)?);
                }
                if let Some(name) = name {
                    metadata.insert("name".to_string(), Value::from(name.as_str()));
                }
            }
            Message::Tool { tool_call_id, .. } => {
                metadata.insert("tool_call_id".to_string(), Value::from(tool_call_id.as_str()));
            }
        }

        Ok(Self {
            position,
            role: message.role().to_string(),
            content: message.text().map(str::to_string),
            metadata: Value::Object(metadata),
        })
    }

    /// Stored rows for a full message list, positions starting at 0
    pub fn from_messages(messages: &[Message]) -> Result<Vec<Self>> {
        messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let position = i32::try_from(i).map_err(|_| {
                    PersistError::Internal(format!("conversation too long to store ({} messages)", messages.len()))
                })?;
                Self::from_message(position, message)
            })
            .collect()
    }

    fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata.get(key).and_then(Value::as_str).map(str::to_string)
    }
}

// Conversion: StoredMessage → mailpilot_llm::Message
impl TryFrom<StoredMessage> for Message {
    type Error = PersistError;

    fn try_from(stored: StoredMessage) -> Result<Self> {
        let name = stored.metadata_str("name");
        let text = || Content::text(stored.content.clone().unwrap_or_default());

        match stored.role.as_str() {
            "system" => Ok(Message::System { content: text(), name }),
            "user" => Ok(Message::Human { content: text(), name }),
            "assistant" => {
                let tool_calls = match stored.metadata.get("tool_calls") {
                    Some(calls) => Some(serde_json::from_value::<Vec<ToolCall>>(calls.clone())?),
                    None => None,
                };
                Ok(Message::AI {
                    content: stored.content.clone().map(Content::Text),
                    tool_calls,
                    name,
                })
            }
            "tool" => {
                let tool_call_id = stored.metadata_str("tool_call_id").ok_or_else(|| {
                    PersistError::InvalidMessage {
                        position: stored.position,
                        reason: "tool result without tool_call_id".to_string(),
                    }
                })?;
                Ok(Message::Tool {
                    tool_call_id,
                    content: text(),
                })
            }
            other => Err(PersistError::InvalidMessage {
                position: stored.position,
                reason: format!("unknown role '{}'", other),
            }),
        }
    }
}
