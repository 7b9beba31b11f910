//! Fire-and-forget event publishing.
//!
//! Session mutations publish facts to an `EventSink` without waiting for a
//! consumer; delivery is decoupled from mutation latency through an
//! unbounded outbound queue. The trait allows swapping the queue for a
//! recording sink in tests.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::domains::sessions::events::SessionEvent;

/// Trait for publishing domain events.
pub trait EventSink: Send + Sync {
    /// Publish an event. Never blocks; failures are logged, not surfaced.
    fn publish(&self, event: SessionEvent);
}

/// Event sink backed by an unbounded queue and a drain task.
pub struct QueueEventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl QueueEventSink {
    /// Create the sink and spawn its drain task.
    ///
    /// The drain task currently logs each event; downstream consumers
    /// (per-user indexes, notifications) attach here.
    pub fn spawn() -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::info!(session_id = %event.session_id(), event = ?event, "session event");
            }
        });

        Arc::new(Self { tx })
    }
}

impl EventSink for QueueEventSink {
    fn publish(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("event queue closed, dropping event");
        }
    }
}

/// Event sink that records published events for test assertions.
#[derive(Default)]
pub struct TestEventSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl TestEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn recorded(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EventSink for TestEventSink {
    fn publish(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{SessionId, UserId};

    #[test]
    fn test_test_sink_records_events() {
        let sink = TestEventSink::new();
        let event = SessionEvent::Created {
            session_id: SessionId::new(),
            creator_id: UserId::new(),
        };
        sink.publish(event.clone());
        assert_eq!(sink.recorded(), vec![event]);
    }

    #[tokio::test]
    async fn test_queue_sink_accepts_events() {
        let sink = QueueEventSink::spawn();
        sink.publish(SessionEvent::Created {
            session_id: SessionId::new(),
            creator_id: UserId::new(),
        });
    }
}
