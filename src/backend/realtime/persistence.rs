/**
 * Message Persistence Seam
 *
 * The real-time core stores chat messages through [`MessageStore`] and only
 * broadcasts what the store accepted. [`PgMessageStore`] is the production
 * implementation; tests substitute an in-memory store.
 */
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::backend::rooms::db;
use crate::shared::ChatMessage;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for chat messages sent over the real-time channel
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and return it with its id and timestamp
    async fn store_message(
        &self,
        room_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<ChatMessage, StoreError>;
}

/// Postgres-backed store
///
/// Inserts the message and seeds a `message_meta` row for every room member.
#[derive(Clone, Debug)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn store_message(
        &self,
        room_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<ChatMessage, StoreError> {
        Ok(db::insert_message(&self.pool, room_id, sender_id, content).await?)
    }
}
