//! Session aggregate store.
//!
//! Persistence is an external concern consumed through this narrow trait;
//! the store is the single source of truth for participant state. The
//! in-memory implementation backs the server process and the tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::common::SessionId;
use crate::domains::sessions::models::SessionEntity;

/// Trait for session aggregate storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a newly created session.
    async fn insert(&self, session: SessionEntity) -> Result<()>;

    /// Fetch one session by id.
    async fn get(&self, id: SessionId) -> Result<Option<SessionEntity>>;

    /// Replace a stored session with an updated aggregate.
    async fn update(&self, session: SessionEntity) -> Result<()>;

    /// Hard-delete a session. Returns whether it existed.
    async fn delete(&self, id: SessionId) -> Result<bool>;

    /// Every stored session (the discovery read path filters from here).
    async fn all(&self) -> Result<Vec<SessionEntity>>;
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntity>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: SessionEntity) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            bail!("session {} already exists", session.id);
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Option<SessionEntity>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn update(&self, session: SessionEntity) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&session.id) {
            bail!("session {} does not exist", session.id);
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<bool> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }

    async fn all(&self) -> Result<Vec<SessionEntity>> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}
