//! Per-session chat fan-out hub.
//!
//! One broadcast channel per session, created on first subscribe. Publishing
//! is best-effort: no subscribers means the frame is dropped (history already
//! holds it), and a slow receiver lags on its own channel without blocking
//! anyone else.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::common::SessionId;
use crate::domains::chat::protocol::ChatFrame;

/// In-process pub/sub hub keyed by session.
///
/// Thread-safe, cloneable.
#[derive(Clone)]
pub struct ChatHub {
    channels: Arc<RwLock<HashMap<SessionId, broadcast::Sender<ChatFrame>>>>,
    capacity: usize,
}

impl ChatHub {
    /// Create a new hub with default capacity (256 frames per channel).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new hub with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish a frame to a session channel. No-op if no subscribers.
    pub async fn publish(&self, session_id: SessionId, frame: ChatFrame) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(&session_id) {
            // Ignore send errors (no active receivers)
            let _ = tx.send(frame);
        }
    }

    /// Subscribe to a session channel. Creates the channel if it doesn't exist.
    pub async fn subscribe(&self, session_id: SessionId) -> broadcast::Receiver<ChatFrame> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Drop a session's channel outright (session-delete cascade).
    /// Connected receivers observe a closed channel and disconnect.
    pub async fn remove(&self, session_id: SessionId) {
        self.channels.write().await.remove(&session_id);
    }

    /// Remove channels with zero subscribers (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}
