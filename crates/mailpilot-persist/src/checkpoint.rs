use async_trait::async_trait;
use mailpilot_llm::Message;

use crate::error::Result;

/// Per-thread message state carried between turns
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Messages saved for `thread_id`, or `None` for a thread never seen before
    async fn load(&self, thread_id: &str) -> Result<Option<Vec<Message>>>;

    /// Overwrite the saved messages for `thread_id`
    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<()>;
}
