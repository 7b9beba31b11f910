//! Chat wire protocol.
//!
//! Every frame on the wire is one JSON envelope: a `"type"` discriminator
//! plus a kind-specific payload. Decoding is two-phase: parse generically to
//! read the discriminator, then decode the full payload against the schema
//! that discriminator selects. An unrecognized discriminator reports the raw
//! string it saw; a payload that fails its nominated schema reports the parse
//! failure. Both are `ProtocolError`, never a fault.
//!
//! Adding a kind means one new `ChatFrame` variant; the exhaustive matches
//! below are the single compile-checked dispatch point, and frames of
//! existing kinds keep decoding unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::common::{MessageId, ProtocolError};
use crate::domains::chat::models::MessageEntity;

/// The closed set of frame kinds carried by the envelope discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Client -> server: send a chat text message.
    ChatMessage,
    /// Server -> client: a persisted message fanned out to the channel.
    ChatBroadcast,
    /// Server -> client: a rejected frame, reported to that connection only.
    Error,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::ChatMessage => write!(f, "chat_message"),
            FrameKind::ChatBroadcast => write!(f, "chat_broadcast"),
            FrameKind::Error => write!(f, "error"),
        }
    }
}

impl FromStr for FrameKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "chat_message" => Ok(FrameKind::ChatMessage),
            "chat_broadcast" => Ok(FrameKind::ChatBroadcast),
            "error" => Ok(FrameKind::Error),
            _ => Err(()),
        }
    }
}

/// Payload of a `chat_message` frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_message_id: Option<MessageId>,
}

/// Payload of an `error` frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: String,
    pub reason: String,
}

/// One decoded envelope - the tagged union over every supported kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatFrame {
    ChatMessage(ChatMessagePayload),
    ChatBroadcast(MessageEntity),
    Error(ErrorPayload),
}

impl ChatFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            ChatFrame::ChatMessage(_) => FrameKind::ChatMessage,
            ChatFrame::ChatBroadcast(_) => FrameKind::ChatBroadcast,
            ChatFrame::Error(_) => FrameKind::Error,
        }
    }

    /// Error frame for a protocol failure on this connection.
    pub fn from_protocol_error(error: &ProtocolError) -> Self {
        let code = match error {
            ProtocolError::UnknownKind(_) => "protocol.unknown_kind",
            ProtocolError::InvalidFrame(_) => "protocol.invalid_frame",
        };
        ChatFrame::Error(ErrorPayload {
            code: code.to_string(),
            reason: error.to_string(),
        })
    }
}

/// Decode one wire frame.
pub fn decode(raw: &str) -> Result<ChatFrame, ProtocolError> {
    // Phase one: generic parse, just enough to read the discriminator.
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ProtocolError::InvalidFrame(e.to_string()))?;

    let raw_kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::InvalidFrame("missing type discriminator".to_string()))?;

    let kind = raw_kind
        .parse::<FrameKind>()
        .map_err(|_| ProtocolError::UnknownKind(raw_kind.to_string()))?;

    // Phase two: full decode against the schema the discriminator selected.
    let frame = match kind {
        FrameKind::ChatMessage => {
            serde_json::from_value::<ChatMessagePayload>(value).map(ChatFrame::ChatMessage)
        }
        FrameKind::ChatBroadcast => {
            serde_json::from_value::<MessageEntity>(value).map(ChatFrame::ChatBroadcast)
        }
        FrameKind::Error => serde_json::from_value::<ErrorPayload>(value).map(ChatFrame::Error),
    };

    frame.map_err(|e| ProtocolError::InvalidFrame(e.to_string()))
}

/// Encode one frame for the wire.
pub fn encode(frame: &ChatFrame) -> Result<String, ProtocolError> {
    serde_json::to_string(frame).map_err(|e| ProtocolError::InvalidFrame(e.to_string()))
}
