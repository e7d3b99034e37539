//! Table definitions for the `mailpilot` schema. Every statement is idempotent.

use sqlx::PgPool;

use crate::error::Result;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS mailpilot",
    r#"CREATE TABLE IF NOT EXISTS mailpilot.users (
        user_id UUID PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS mailpilot.conversations (
        conversation_id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES mailpilot.users (user_id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS mailpilot.messages (
        id BIGSERIAL PRIMARY KEY,
        conversation_id UUID NOT NULL REFERENCES mailpilot.conversations (conversation_id) ON DELETE CASCADE,
        user_id UUID NOT NULL,
        position INTEGER NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('system', 'user', 'assistant', 'tool')),
        content TEXT,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS messages_conversation_position_idx ON mailpilot.messages (conversation_id, position)",
    r#"CREATE TABLE IF NOT EXISTS mailpilot.checkpoints (
        thread_id TEXT PRIMARY KEY,
        messages JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
];

/// Create the application and checkpoint tables
pub async fn setup(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(statements = SCHEMA_STATEMENTS.len(), "Schema ready");
    Ok(())
}
