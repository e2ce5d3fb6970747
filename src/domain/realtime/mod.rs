//! Realtime messaging domain: delivery groups and the events that flow
//! through them.
//!
//! # Module Organization
//!
//! - `group` - Named delivery groups (per-room chat, global notifications)
//! - `events` - Room and notification event unions, chat text sanitization
//! - `error` - Handshake and inbound-frame failure taxonomy

mod error;
mod events;
mod group;

pub use error::{HandshakeError, InboundError};
pub use events::{
    sanitize_message, ChatMessageBroadcast, GroupEvent, MessageNotice, NotificationEvent,
    RoomEvent, SystemNotice,
};
pub use group::Group;
