//! WebSocket frame types for the chat and notification endpoints.
//!
//! Defines the protocol between server and connected clients:
//! - Client → Server: chat messages and typing indicators
//! - Server → Client: room broadcasts, notification pushes, error replies

use serde::Serialize;
use serde_json::Value;

use crate::domain::realtime::{InboundError, NotificationEvent, RoomEvent};

// ============================================
// Client → Server Frames
// ============================================

/// A parsed inbound frame on a chat connection.
///
/// The `type` field defaults to `message` when absent, matching what
/// clients have always sent. Frames with an unrecognized type parse to
/// [`InboundFrame::Ignored`] so the caller can drop them quietly; a
/// frame that is not a JSON object at all, or whose `message` value is
/// not a string, is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A chat message, raw and unsanitized.
    Message { content: String },

    /// The sender started typing.
    TypingStart,

    /// The sender stopped typing.
    TypingStop,

    /// A frame of a type this endpoint does not handle.
    Ignored { kind: String },
}

impl InboundFrame {
    /// Parses one text frame from a client.
    pub fn parse(text: &str) -> Result<Self, InboundError> {
        let value: Value =
            serde_json::from_str(text).map_err(|_| InboundError::InvalidJson)?;
        let frame = value
            .as_object()
            .ok_or_else(|| InboundError::internal("inbound frame is not a JSON object"))?;

        let kind = match frame.get("type") {
            None => "message",
            Some(Value::String(kind)) => kind.as_str(),
            Some(_) => {
                return Ok(InboundFrame::Ignored {
                    kind: "<non-string>".to_string(),
                })
            }
        };

        match kind {
            "message" => {
                // A missing message field reads as empty text; the
                // channel turns that into the empty-message reply.
                let content = match frame.get("message") {
                    None => String::new(),
                    Some(Value::String(content)) => content.clone(),
                    Some(_) => {
                        return Err(InboundError::internal("message field is not a string"))
                    }
                };
                Ok(InboundFrame::Message { content })
            }
            "typing_start" => Ok(InboundFrame::TypingStart),
            "typing_stop" => Ok(InboundFrame::TypingStop),
            other => Ok(InboundFrame::Ignored {
                kind: other.to_string(),
            }),
        }
    }
}

// ============================================
// Server → Client Frames
// ============================================

/// Error reply pushed to the offending sender only.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    pub error: &'static str,
}

impl From<&InboundError> for ErrorReply {
    fn from(error: &InboundError) -> Self {
        Self {
            error: error.client_reply(),
        }
    }
}

impl ErrorReply {
    /// Serializes the reply frame.
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).expect("ErrorReply serialization should not fail")
    }
}

/// Serializes a room event into its client-facing frame.
///
/// Chat messages go out as the bare broadcast object with no `type`
/// discriminator; every other room event keeps its tag.
pub fn room_event_frame(event: &RoomEvent) -> String {
    match event {
        RoomEvent::ChatMessage(broadcast) => serde_json::to_string(broadcast),
        other => serde_json::to_string(other),
    }
    .expect("RoomEvent serialization should not fail")
}

/// Serializes a notification event into its client-facing frame.
pub fn notification_frame(event: &NotificationEvent) -> String {
    serde_json::to_string(event).expect("NotificationEvent serialization should not fail")
}
