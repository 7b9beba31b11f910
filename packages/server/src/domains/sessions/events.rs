//! Session domain events - immutable facts about state transitions.
//!
//! Published fire-and-forget to the event sink after every successful
//! mutation; consumers (per-user session indexes, notifications) never block
//! the mutation path.

use serde::Serialize;

use crate::common::{SessionId, UserId};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Created {
        session_id: SessionId,
        creator_id: UserId,
    },
    UserJoined {
        session_id: SessionId,
        user_id: UserId,
    },
    UserLeft {
        session_id: SessionId,
        user_id: UserId,
    },
    UserKicked {
        session_id: SessionId,
        user_id: UserId,
        kicked_by: UserId,
    },
    Deleted {
        session_id: SessionId,
        deleted_by: UserId,
    },
}

impl SessionEvent {
    /// Session the event belongs to.
    pub fn session_id(&self) -> SessionId {
        match self {
            SessionEvent::Created { session_id, .. }
            | SessionEvent::UserJoined { session_id, .. }
            | SessionEvent::UserLeft { session_id, .. }
            | SessionEvent::UserKicked { session_id, .. }
            | SessionEvent::Deleted { session_id, .. } => *session_id,
        }
    }
}
