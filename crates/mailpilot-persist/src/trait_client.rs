use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::ids::ConversationKey;
use crate::models::StoredMessage;

/// Trait for message history storage
///
/// Implementations mirror the in-memory conversation into durable rows.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Replace every stored message of a conversation, as one unit.
    ///
    /// Upserts the user and conversation rows, deletes the previous rows for
    /// the conversation and inserts `messages` in order.
    async fn replace_messages(&self, key: &ConversationKey, messages: &[StoredMessage]) -> Result<()>;

    /// Stored messages of a conversation, ordered by position
    async fn load_messages(&self, conversation_id: Uuid) -> Result<Vec<StoredMessage>>;
}
