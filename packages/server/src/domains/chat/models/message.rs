use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{MessageId, SessionId, UserId};

/// Message - one chat message in a session channel.
///
/// Immutable once appended. `parent_message_id` is a back-reference for
/// threaded replies within the same session; history is append-only and
/// messages are only ever removed by the session-delete cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntity {
    pub id: MessageId,
    pub session_id: SessionId,
    pub creator_id: UserId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_message_id: Option<MessageId>,
}

impl MessageEntity {
    pub fn new(
        session_id: SessionId,
        creator_id: UserId,
        message: String,
        parent_message_id: Option<MessageId>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            session_id,
            creator_id,
            message,
            created_at: Utc::now(),
            parent_message_id,
        }
    }
}
