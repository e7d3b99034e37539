//! In-process backends, used when no database is configured and in tests.

use async_trait::async_trait;
use mailpilot_llm::Message;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::checkpoint::Checkpointer;
use crate::error::{PersistError, Result};
use crate::ids::ConversationKey;
use crate::models::StoredMessage;
use crate::trait_client::PersistenceClient;

#[derive(Debug, Clone)]
struct MemoryConversation {
    user_id: Uuid,
    messages: Vec<StoredMessage>,
}

#[derive(Default)]
struct MemoryTables {
    users: HashSet<Uuid>,
    conversations: HashMap<Uuid, MemoryConversation>,
}

/// Persistence client backed by a map; counts every storage operation
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    tables: RwLock<MemoryTables>,
    operations: AtomicUsize,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `replace_messages` calls that reached storage
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub async fn conversation_count(&self) -> usize {
        self.tables.read().await.conversations.len()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Owner of a stored conversation
    pub async fn conversation_user(&self, conversation_id: Uuid) -> Option<Uuid> {
        self.tables
            .read()
            .await
            .conversations
            .get(&conversation_id)
            .map(|c| c.user_id)
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn replace_messages(&self, key: &ConversationKey, messages: &[StoredMessage]) -> Result<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);

        let mut tables = self.tables.write().await;
        tables.users.insert(key.user_id);
        let conversation = tables
            .conversations
            .entry(key.conversation_id)
            .or_insert_with(|| MemoryConversation {
                user_id: key.user_id,
                messages: Vec::new(),
            });
        conversation.messages = messages.to_vec();
        Ok(())
    }

    async fn load_messages(&self, conversation_id: Uuid) -> Result<Vec<StoredMessage>> {
        let tables = self.tables.read().await;
        let mut messages = tables
            .conversations
            .get(&conversation_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default();
        messages.sort_by_key(|m| m.position);
        Ok(messages)
    }
}

/// Checkpoints kept in memory for the life of the process
#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Option<Vec<Message>>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<()> {
        if thread_id.is_empty() {
            return Err(PersistError::Internal("thread id must not be empty".to_string()));
        }
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), messages.to_vec());
        Ok(())
    }
}
