//! Chat message history store.
//!
//! Durable append precedes live fan-out: a message lands here before it is
//! published to connected participants, so history is the recovery path for
//! any frame a connection missed.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::common::{MessageId, SessionId};
use crate::domains::chat::models::MessageEntity;

/// Trait for chat message storage.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to its session's history.
    async fn append(&self, message: MessageEntity) -> Result<()>;

    /// Fetch one message by id within a session.
    async fn get(&self, session_id: SessionId, id: MessageId) -> Result<Option<MessageEntity>>;

    /// Full history for a session, ascending by creation time.
    async fn history(&self, session_id: SessionId) -> Result<Vec<MessageEntity>>;

    /// Drop every message of a session (session-delete cascade).
    async fn delete_all_for_session(&self, session_id: SessionId) -> Result<()>;
}

/// In-memory message store.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<HashMap<SessionId, Vec<MessageEntity>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: MessageEntity) -> Result<()> {
        self.messages
            .write()
            .await
            .entry(message.session_id)
            .or_default()
            .push(message);
        Ok(())
    }

    async fn get(&self, session_id: SessionId, id: MessageId) -> Result<Option<MessageEntity>> {
        Ok(self
            .messages
            .read()
            .await
            .get(&session_id)
            .and_then(|history| history.iter().find(|message| message.id == id).cloned()))
    }

    async fn history(&self, session_id: SessionId) -> Result<Vec<MessageEntity>> {
        Ok(self
            .messages
            .read()
            .await
            .get(&session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_all_for_session(&self, session_id: SessionId) -> Result<()> {
        self.messages.write().await.remove(&session_id);
        Ok(())
    }
}
