//! Chat service: membership-gated send and history reads.
//!
//! Persistence precedes fan-out: a message is appended to the store before
//! it is published to the hub, so it is never lost to a briefly unreachable
//! recipient.

use std::sync::Arc;

use crate::common::{paginate, ApiError, MessageId, SessionId, UserId, ValidatedPage};
use crate::domains::chat::channel::ChatHub;
use crate::domains::chat::models::MessageEntity;
use crate::domains::chat::protocol::{ChatFrame, ChatMessagePayload};
use crate::domains::chat::store::MessageStore;
use crate::domains::sessions::store::SessionStore;

pub struct ChatService {
    sessions: Arc<dyn SessionStore>,
    messages: Arc<dyn MessageStore>,
    hub: ChatHub,
}

impl ChatService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        messages: Arc<dyn MessageStore>,
        hub: ChatHub,
    ) -> Self {
        Self {
            sessions,
            messages,
            hub,
        }
    }

    /// Only current participants may send or receive on a session channel.
    pub async fn authorize_participant(
        &self,
        session_id: SessionId,
        user: UserId,
    ) -> Result<(), ApiError> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| ApiError::not_found("session does not exist"))?;

        if !session.is_participant(user) {
            return Err(ApiError::forbidden("only participants may use the chat"));
        }
        Ok(())
    }

    /// Subscribe to a session's live channel.
    pub async fn subscribe(
        &self,
        session_id: SessionId,
    ) -> tokio::sync::broadcast::Receiver<ChatFrame> {
        self.hub.subscribe(session_id).await
    }

    /// Persist a message, then fan it out to connected participants.
    pub async fn send(
        &self,
        session_id: SessionId,
        sender: UserId,
        payload: ChatMessagePayload,
    ) -> Result<MessageEntity, ApiError> {
        self.authorize_participant(session_id, sender).await?;

        if payload.message.trim().is_empty() {
            return Err(ApiError::invalid(
                "message.empty",
                "message must not be empty",
            ));
        }

        if let Some(parent_id) = payload.parent_message_id {
            self.require_parent(session_id, parent_id).await?;
        }

        let message = MessageEntity::new(
            session_id,
            sender,
            payload.message.trim().to_string(),
            payload.parent_message_id,
        );

        // Durable append first; fan-out is best-effort on top of it.
        self.messages.append(message.clone()).await?;
        self.hub
            .publish(session_id, ChatFrame::ChatBroadcast(message.clone()))
            .await;

        tracing::debug!(
            session_id = %session_id,
            message_id = %message.id,
            "chat message appended and published"
        );

        Ok(message)
    }

    /// Paginated history, ascending creation time, participants only.
    pub async fn history(
        &self,
        session_id: SessionId,
        requester: UserId,
        page: &ValidatedPage,
    ) -> Result<(Vec<MessageEntity>, bool), ApiError> {
        self.authorize_participant(session_id, requester).await?;
        let history = self.messages.history(session_id).await?;
        Ok(paginate(history, page))
    }

    /// A reply must reference a message of the same session.
    async fn require_parent(
        &self,
        session_id: SessionId,
        parent_id: MessageId,
    ) -> Result<(), ApiError> {
        self.messages
            .get(session_id, parent_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("parent message does not exist in this session"))
    }
}
