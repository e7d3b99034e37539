use async_trait::async_trait;
use mailpilot_llm::Message;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::checkpoint::Checkpointer;
use crate::error::{PersistError, Result};
use crate::ids::ConversationKey;
use crate::models::StoredMessage;
use crate::trait_client::PersistenceClient;

const MAX_CONNECTIONS: u32 = 5;

/// Pool that opens connections on first use
pub fn lazy_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_lazy(database_url)
        .map_err(|e| PersistError::Connection(e.to_string()))
}

pub struct PostgresPersistenceClient {
    pool: PgPool,
}

impl PostgresPersistenceClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceClient for PostgresPersistenceClient {
    async fn replace_messages(&self, key: &ConversationKey, messages: &[StoredMessage]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO mailpilot.users (user_id, updated_at)
            VALUES ($1, now())
            ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
            "#,
        )
        .bind(key.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO mailpilot.conversations (conversation_id, user_id, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (conversation_id) DO UPDATE SET updated_at = now()
            "#,
        )
        .bind(key.conversation_id)
        .bind(key.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM mailpilot.messages WHERE conversation_id = $1")
            .bind(key.conversation_id)
            .execute(&mut *tx)
            .await?;

        for message in messages {
            sqlx::query(
                r#"
                INSERT INTO mailpilot.messages (conversation_id, user_id, position, role, content, metadata)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(key.conversation_id)
            .bind(key.user_id)
            .bind(message.position)
            .bind(&message.role)
            .bind(message.content.as_deref())
            .bind(&message.metadata)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_messages(&self, conversation_id: Uuid) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT position, role, content, metadata
            FROM mailpilot.messages
            WHERE conversation_id = $1
            ORDER BY position
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<StoredMessage> {
                Ok(StoredMessage {
                    position: row.try_get("position")?,
                    role: row.try_get("role")?,
                    content: row.try_get("content")?,
                    metadata: row.try_get("metadata")?,
                })
            })
            .collect()
    }
}

/// Checkpoints stored in `mailpilot.checkpoints`, one JSON row per thread
pub struct PostgresCheckpointer {
    pool: PgPool,
}

impl PostgresCheckpointer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Checkpointer for PostgresCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Option<Vec<Message>>> {
        let row = sqlx::query("SELECT messages FROM mailpilot.checkpoints WHERE thread_id = $1")
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let messages: Value = row.try_get("messages")?;
                Ok(Some(serde_json::from_value(messages)?))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<()> {
        let messages = serde_json::to_value(messages)?;
        sqlx::query(
            r#"
            INSERT INTO mailpilot.checkpoints (thread_id, messages, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (thread_id) DO UPDATE SET messages = EXCLUDED.messages, updated_at = now()
            "#,
        )
        .bind(thread_id)
        .bind(&messages)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
