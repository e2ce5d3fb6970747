//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier for a chat room.
///
/// Rooms are keyed by the integer primary key of the room record in the
/// panel service. On the wire (the WebSocket path segment) the id arrives
/// as a string and must be composed entirely of ASCII digits; anything
/// else is a validation failure, not a lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(u64);

impl RoomId {
    /// Creates a RoomId from a known room key.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the inner room key.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::empty_field("room_id"));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "room_id",
                "must contain only digits",
            ));
        }
        let id = s.parse::<u64>().map_err(|_| {
            ValidationError::invalid_format("room_id", "exceeds the integer key range")
        })?;
        Ok(Self(id))
    }
}

/// Serde helpers for fields that carry a room id as a JSON string.
///
/// Wire frames inherit the string form from the connection path, so
/// `"room_id": "42"` rather than `"room_id": 42`.
pub mod room_id_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RoomId;

    pub fn serialize<S>(room: &RoomId, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(room)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<RoomId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Unique identifier for one WebSocket connection.
///
/// Generated when a socket is accepted and used as the subscriber key in
/// the message bus. Two connections from the same user get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier (typically from auth provider).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
