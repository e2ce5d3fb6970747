//! Named delivery groups.
//!
//! A group is the unit of fan-out in the message bus: every connection
//! subscribed to a group receives every event published to it. Two kinds
//! exist: one group per chat room, and a single process-wide group for
//! user notifications.

use std::fmt;

use crate::domain::foundation::RoomId;

/// Key prefix for per-room chat groups.
pub const CHAT_GROUP_PREFIX: &str = "chat_";

/// Key of the global notification group.
pub const NOTIFICATIONS_GROUP: &str = "notifications";

/// A named delivery group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// The chat group for one room, keyed `chat_<room_id>`.
    Chat(RoomId),
    /// The global notification group, keyed `notifications`.
    Notifications,
}

impl Group {
    /// Creates the chat group for a room.
    pub fn chat(room: RoomId) -> Self {
        Group::Chat(room)
    }

    /// Returns the group key used by the bus and the broker.
    pub fn key(&self) -> String {
        match self {
            Group::Chat(room) => format!("{}{}", CHAT_GROUP_PREFIX, room),
            Group::Notifications => NOTIFICATIONS_GROUP.to_string(),
        }
    }

    /// Parses a group key back into a group.
    ///
    /// Returns `None` for keys this service does not route, so broker
    /// traffic on foreign channels is dropped rather than misdelivered.
    pub fn from_key(key: &str) -> Option<Self> {
        if key == NOTIFICATIONS_GROUP {
            return Some(Group::Notifications);
        }
        let room = key.strip_prefix(CHAT_GROUP_PREFIX)?;
        room.parse::<RoomId>().ok().map(Group::Chat)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
