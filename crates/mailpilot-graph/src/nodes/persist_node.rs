use crate::node::{EventSender, Node, NodeType};
use crate::types::{GraphState, StreamEvent};
use anyhow::Result;
use async_trait::async_trait;
use mailpilot_persist::{sync_conversation, PersistenceClient, SyncOutcome};
use std::sync::Arc;

/// Mirrors the conversation into storage at the end of a turn.
///
/// Storage failures are logged and dropped; they never fail the turn.
pub struct PersistNode {
    client: Option<Arc<dyn PersistenceClient>>,
    thread_id: String,
    user_id: String,
}

impl PersistNode {
    pub fn new(
        client: Option<Arc<dyn PersistenceClient>>,
        thread_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            thread_id: thread_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Node that never stores anything
    pub fn disabled() -> Self {
        Self::new(None, String::new(), String::new())
    }
}

#[async_trait]
impl Node for PersistNode {
    async fn execute(&self, state: &mut GraphState, event_tx: EventSender) -> Result<()> {
        let Some(client) = &self.client else {
            tracing::debug!("PERSIST_NODE: persistence disabled");
            return Ok(());
        };

        match sync_conversation(
            client.as_ref(),
            &self.thread_id,
            &self.user_id,
            &state.messages,
        )
        .await
        {
            Ok(SyncOutcome::Synced { rows }) => {
                state.persisted = true;
                event_tx.send(StreamEvent::Persisted { rows }).await?;
            }
            Ok(SyncOutcome::Skipped) => {}
            Err(e) => {
                tracing::warn!(
                    thread_id = %self.thread_id,
                    error = %e,
                    "PERSIST_NODE: failed to persist messages"
                );
            }
        }

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Persist
    }
}
