//! Events that flow through delivery groups.
//!
//! Two unions exist, one per group kind:
//!
//! - [`RoomEvent`] - everything published to a `chat_<room>` group
//!   (messages, typing indicators, presence deltas)
//! - [`NotificationEvent`] - everything published to the global
//!   `notifications` group
//!
//! Both serialize with a `"type"` discriminator, which is also the wire
//! form the broker carries between processes. The chat broadcast frame a
//! client sees is the *inner* [`ChatMessageBroadcast`] struct without the
//! discriminator; see `adapters::websocket::messages` for frame assembly.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{room_id_string, AuthenticatedUser, RoomId, Timestamp, UserId};

/// Hard cap on chat message length, counted in characters.
///
/// Anything longer is silently truncated; clients are not told.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Trims surrounding whitespace and applies the length cap.
///
/// Returns `None` when nothing but whitespace remains. Truncation counts
/// characters, not bytes, so multi-byte text is never split mid-character.
pub fn sanitize_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_MESSAGE_CHARS).collect())
}

/// A chat message as broadcast to every member of a room group.
///
/// `timestamp` is assigned by the server when the event is built for
/// publishing, never taken from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageBroadcast {
    pub message: String,
    pub sender: String,
    pub user_id: UserId,
    pub display_name: String,
    pub timestamp: Timestamp,
    // Carried as a string on the wire, like the path segment it came from.
    #[serde(with = "room_id_string")]
    pub room_id: RoomId,
}

impl ChatMessageBroadcast {
    /// Builds a broadcast for sanitized content, stamping it now.
    pub fn compose(content: String, sender: &AuthenticatedUser, room: RoomId) -> Self {
        let display = sender.display_identity().to_string();
        Self {
            message: content,
            sender: display.clone(),
            user_id: sender.id.clone(),
            display_name: display,
            timestamp: Timestamp::now(),
            room_id: room,
        }
    }
}

/// Events published to a room's chat group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A chat message, delivered to every member including the sender.
    ChatMessage(ChatMessageBroadcast),

    /// A member started typing.
    TypingStart { user_id: UserId, display_name: String },

    /// A member stopped typing.
    TypingStop { user_id: UserId },

    /// A member's connection reached OPEN.
    PresenceJoin { user_id: UserId, display_name: String },

    /// A member's connection went away.
    PresenceLeave { user_id: UserId },
}

impl RoomEvent {
    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::ChatMessage(_) => "chat_message",
            RoomEvent::TypingStart { .. } => "typing_start",
            RoomEvent::TypingStop { .. } => "typing_stop",
            RoomEvent::PresenceJoin { .. } => "presence_join",
            RoomEvent::PresenceLeave { .. } => "presence_leave",
        }
    }
}

/// A chat/new-message notice carried on the notification group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageNotice {
    pub message: String,
    pub user_id: UserId,
    pub display_name: String,
    #[serde(with = "room_id_string")]
    pub room_id: RoomId,
}

impl MessageNotice {
    pub fn new(
        message: impl Into<String>,
        user_id: UserId,
        display_name: impl Into<String>,
        room_id: RoomId,
    ) -> Self {
        Self {
            message: message.into(),
            user_id,
            display_name: display_name.into(),
            room_id,
        }
    }
}

/// A system-wide announcement carried on the notification group.
///
/// Publishers may omit `title` and `notification_type`; the defaults
/// are filled in when the event is parsed or constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotice {
    pub message: String,
    #[serde(default = "default_system_title")]
    pub title: String,
    #[serde(default = "default_notification_type")]
    pub notification_type: String,
}

impl SystemNotice {
    /// Creates a notice with the default title and type.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: default_system_title(),
            notification_type: default_notification_type(),
        }
    }

    /// Overrides the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Overrides the notification type.
    pub fn with_notification_type(mut self, kind: impl Into<String>) -> Self {
        self.notification_type = kind.into();
        self
    }
}

fn default_system_title() -> String {
    "System Notification".to_string()
}

fn default_notification_type() -> String {
    "system".to_string()
}

/// Events published to the global notification group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// Notice that a chat message was posted somewhere.
    ChatMessage(MessageNotice),

    /// Notice that a new message record was created.
    NewMessage(MessageNotice),

    /// System-wide announcement, delivered to everyone.
    SystemNotification(SystemNotice),
}

impl NotificationEvent {
    /// The user the event originated from.
    ///
    /// Delivery withholds the event from this user's own subscriptions;
    /// system notices have no origin and reach everyone.
    pub fn origin_user(&self) -> Option<&UserId> {
        match self {
            NotificationEvent::ChatMessage(n) | NotificationEvent::NewMessage(n) => {
                Some(&n.user_id)
            }
            NotificationEvent::SystemNotification(_) => None,
        }
    }

    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::ChatMessage(_) => "chat_message",
            NotificationEvent::NewMessage(_) => "new_message",
            NotificationEvent::SystemNotification(_) => "system_notification",
        }
    }
}

/// Union of everything the message bus carries.
///
/// Serializes as the inner event (whose own `"type"` tag is the wire
/// discriminator). It is deliberately not deserializable on its own:
/// decoding requires knowing the group kind, because chat and
/// notification events share tag values. The broker adapter picks the
/// inner type from the group key before parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupEvent {
    Room(RoomEvent),
    Notification(NotificationEvent),
}

impl GroupEvent {
    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupEvent::Room(event) => event.kind(),
            GroupEvent::Notification(event) => event.kind(),
        }
    }
}

impl From<RoomEvent> for GroupEvent {
    fn from(event: RoomEvent) -> Self {
        GroupEvent::Room(event)
    }
}

impl From<NotificationEvent> for GroupEvent {
    fn from(event: NotificationEvent) -> Self {
        GroupEvent::Notification(event)
    }
}
