//! Per-session chat channel endpoints.
//!
//! GET /api/v1/session/{id}/chat           - WebSocket upgrade
//! GET /api/v1/session/{id}/chat/history   - paginated history
//!
//! Auth strategy for the socket: JWT passed as `?token=` query param, with
//! an `Authorization` header fallback. Browser WebSocket clients can't set
//! custom headers during the upgrade, so the query param is the primary
//! path.
//!
//! A protocol failure on an inbound frame is answered with an `error` frame
//! on that connection only; the channel stays open. Binary frames are a
//! hard framing violation and close the connection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, Path, Query};
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, Response};
use axum::Json;
use futures::stream::StreamExt;
use futures::SinkExt;
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};

use crate::common::{ApiError, PageQuery, SessionId, UserId};
use crate::domains::chat::models::MessageEntity;
use crate::domains::chat::protocol::{self, ChatFrame, ErrorPayload};
use crate::server::app::AppState;
use crate::server::middleware::CurrentUser;

#[derive(Deserialize)]
pub struct ChatSocketQuery {
    /// JWT token for authentication
    token: Option<String>,
}

/// WebSocket upgrade handler. Participants only.
pub async fn chat_socket_handler(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<SessionId>,
    Query(query): Query<ChatSocketQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .or_else(|| extract_bearer_token(&headers))
        .ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .jwt_service
        .verify_token(&token)
        .map_err(|_| ApiError::Unauthenticated)?;
    let user = UserId::from_uuid(claims.user_id);

    state.chat.authorize_participant(session_id, user).await?;

    Ok(ws.on_upgrade(move |socket| chat_connection(state, session_id, user, socket)))
}

/// GET /api/v1/session/{session_id}/chat/history
pub async fn chat_history(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
    Query(page): Query<PageQuery>,
) -> Result<
    (
        AppendHeaders<[(&'static str, String); 1]>,
        Json<Vec<MessageEntity>>,
    ),
    ApiError,
> {
    let (messages, has_more) = state
        .chat
        .history(session_id, user.user_id, &page.validate())
        .await?;
    Ok((
        AppendHeaders([("x-has-more-entries", has_more.to_string())]),
        Json(messages),
    ))
}

/// One upgraded connection: a forwarding task drains the session channel
/// (plus this connection's own error frames) into the socket while the
/// inbound loop decodes and dispatches client frames.
async fn chat_connection(state: AppState, session_id: SessionId, user: UserId, socket: WebSocket) {
    tracing::debug!(session_id = %session_id, user_id = %user, "chat connection opened");

    let (mut sink, mut stream) = socket.split();
    let mut channel_rx = state.chat.subscribe(session_id).await;
    // Error frames for this connection only; never broadcast.
    let (direct_tx, mut direct_rx) = mpsc::channel::<ChatFrame>(16);

    let send_chat = state.chat.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                broadcast = channel_rx.recv() => match broadcast {
                    Ok(frame) => {
                        // Membership can be revoked mid-connection (kick,
                        // leave); a former participant stops receiving.
                        if send_chat
                            .authorize_participant(session_id, user)
                            .await
                            .is_err()
                        {
                            break;
                        }
                        frame
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // At-most-once per connection: skip and keep going,
                        // history is the recovery path.
                        tracing::warn!(missed, "chat connection lagged");
                        continue;
                    }
                    // Channel removed: the session was deleted.
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                direct = direct_rx.recv() => match direct {
                    Some(frame) => frame,
                    None => break,
                },
            };

            let text = match protocol::encode(&frame) {
                Ok(text) => text,
                Err(error) => {
                    tracing::error!(error = %error, "failed to encode outbound chat frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_chat = state.chat.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            let message = match result {
                Ok(message) => message,
                Err(error) => {
                    tracing::debug!(error = %error, "chat connection errored");
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    let reply = match protocol::decode(&text) {
                        Ok(ChatFrame::ChatMessage(payload)) => {
                            match recv_chat.send(session_id, user, payload).await {
                                // Fan-out happens through the session channel.
                                Ok(_) => None,
                                Err(error) => Some(reject_frame(&error)),
                            }
                        }
                        // Server-to-client kinds are not accepted inbound.
                        Ok(other) => Some(ChatFrame::Error(ErrorPayload {
                            code: "protocol.unexpected_kind".to_string(),
                            reason: format!("{} frames are not accepted from clients", other.kind()),
                        })),
                        Err(protocol_error) => {
                            Some(ChatFrame::from_protocol_error(&protocol_error))
                        }
                    };

                    if let Some(frame) = reply {
                        if direct_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
                // Hard framing violation: the envelope is text-only JSON.
                Message::Binary(_) => {
                    tracing::debug!(session_id = %session_id, "binary frame received, closing");
                    break;
                }
                // Pongs are answered at the protocol layer.
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => break,
            }
        }
    });

    // Either half ending tears down the other.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(session_id = %session_id, user_id = %user, "chat connection closed");
}

/// Error frame for a rejected inbound frame.
fn reject_frame(error: &ApiError) -> ChatFrame {
    let code = match error {
        ApiError::Validation(_) => "validation",
        ApiError::Unauthenticated => "unauthenticated",
        ApiError::Forbidden(_) => "forbidden",
        ApiError::NotFound(_) => "not_found",
        ApiError::Conflict(_) => "conflict",
        ApiError::Protocol(protocol_error) => return ChatFrame::from_protocol_error(protocol_error),
        ApiError::Internal(_) => "internal",
    };

    let reason = match error {
        // Never leak internals to the channel.
        ApiError::Internal(_) => "an internal error occurred".to_string(),
        other => other.to_string(),
    };

    ChatFrame::Error(ErrorPayload {
        code: code.to_string(),
        reason,
    })
}

/// Extract Bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    auth.strip_prefix("Bearer ").map(|t| t.to_string())
}
