//! Failure taxonomy for the realtime surfaces.
//!
//! Handshake failures map to WebSocket close codes; inbound frame
//! failures map to the literal error replies clients key off. The
//! strings in `client_reply` are protocol, not prose - do not reword.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Close code for validation and unexpected handshake failures.
pub const CLOSE_INVALID: u16 = 4000;

/// Close code for permission failures (anonymous or access denied).
pub const CLOSE_FORBIDDEN: u16 = 4001;

/// Why a connection handshake was refused.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The room id path segment failed format validation.
    #[error("invalid room id: {0}")]
    InvalidRoom(#[from] ValidationError),

    /// No identity could be resolved for the connection.
    #[error("authentication required")]
    Anonymous,

    /// The caller is authenticated but may not enter the room.
    #[error("no access to this room")]
    AccessDenied,

    /// Anything else that broke while evaluating the handshake.
    #[error("handshake failed: {0}")]
    Unexpected(String),
}

impl HandshakeError {
    /// Creates an unexpected handshake failure from any error.
    pub fn unexpected(source: impl std::fmt::Display) -> Self {
        HandshakeError::Unexpected(source.to_string())
    }

    /// The WebSocket close code sent for this failure.
    pub fn close_code(&self) -> u16 {
        match self {
            HandshakeError::InvalidRoom(_) | HandshakeError::Unexpected(_) => CLOSE_INVALID,
            HandshakeError::Anonymous | HandshakeError::AccessDenied => CLOSE_FORBIDDEN,
        }
    }

    /// Short reason text for the close frame.
    pub fn close_reason(&self) -> &'static str {
        match self {
            HandshakeError::InvalidRoom(_) => "invalid room id",
            HandshakeError::Anonymous => "authentication required",
            HandshakeError::AccessDenied => "access denied",
            HandshakeError::Unexpected(_) => "connection failed",
        }
    }
}

/// Why an inbound chat frame was refused.
///
/// Each variant corresponds to exactly one reply frame sent to the
/// offending sender; the connection always stays open.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Frame body was not parseable JSON.
    #[error("Invalid JSON format")]
    InvalidJson,

    /// Message text was empty after trimming.
    #[error("Empty message")]
    EmptyMessage,

    /// Anything else that broke while handling the frame.
    #[error("Internal server error")]
    Internal(String),
}

impl InboundError {
    /// Creates an internal error from any failure, keeping the cause
    /// for logging.
    pub fn internal(source: impl std::fmt::Display) -> Self {
        InboundError::Internal(source.to_string())
    }

    /// The literal error text sent back to the sender.
    pub fn client_reply(&self) -> &'static str {
        match self {
            InboundError::InvalidJson => "Invalid JSON format",
            InboundError::EmptyMessage => "Empty message",
            InboundError::Internal(_) => "Internal server error",
        }
    }

    /// The underlying cause, present only for internal errors.
    pub fn cause(&self) -> Option<&str> {
        match self {
            InboundError::Internal(cause) => Some(cause),
            _ => None,
        }
    }
}
