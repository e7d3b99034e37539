use mailpilot_llm::Message;

use crate::error::Result;
use crate::ids::ConversationKey;
use crate::models::StoredMessage;
use crate::trait_client::PersistenceClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Stored history now mirrors the message list
    Synced { rows: usize },
    /// Nothing to store
    Skipped,
}

/// Replace the stored history for `thread_id` with `messages`.
///
/// An empty list touches nothing.
pub async fn sync_conversation(
    client: &dyn PersistenceClient,
    thread_id: &str,
    user_id: &str,
    messages: &[Message],
) -> Result<SyncOutcome> {
    if messages.is_empty() {
        tracing::debug!(thread_id = %thread_id, "No messages to persist");
        return Ok(SyncOutcome::Skipped);
    }

    let key = ConversationKey::derive(thread_id, user_id);
    let rows = StoredMessage::from_messages(messages)?;

    client.replace_messages(&key, &rows).await?;

    tracing::info!(
        thread_id = %thread_id,
        conversation_id = %key.conversation_id,
        rows = rows.len(),
        "Persisted conversation"
    );
    Ok(SyncOutcome::Synced { rows: rows.len() })
}
