//! Mock panel adapters for testing.
//!
//! Test implementations of the `RoomAccess` and `MessageArchive` ports
//! that keep everything in process: an allow-list access predicate and a
//! recording archive. Both are configured up front with builders.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{RoomId, UserId};
use crate::ports::{AccessError, ArchiveError, MessageArchive, RoomAccess};

/// Mock room access predicate for testing.
///
/// Grants access to (user, room) pairs on its allow-list and denies
/// everyone else.
#[derive(Debug, Default)]
pub struct MockRoomAccess {
    /// Pairs of (user id, room key) that may join
    allowed: HashSet<(String, u64)>,
    /// When set, every check fails with this error
    outage: Option<AccessError>,
}

impl MockRoomAccess {
    /// Creates a new mock that denies everyone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows a user into a room.
    pub fn with_member(mut self, user_id: impl Into<String>, room: RoomId) -> Self {
        self.allowed.insert((user_id.into(), room.as_u64()));
        self
    }

    /// Makes every check fail with the given error.
    pub fn with_error(mut self, error: AccessError) -> Self {
        self.outage = Some(error);
        self
    }
}

#[async_trait]
impl RoomAccess for MockRoomAccess {
    async fn can_access(&self, user: &UserId, room: RoomId) -> Result<bool, AccessError> {
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }

        Ok(self
            .allowed
            .contains(&(user.as_str().to_string(), room.as_u64())))
    }
}

/// One message recorded by [`InMemoryMessageArchive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub room: RoomId,
    pub sender: UserId,
    pub content: String,
}

/// In-memory recording archive for testing.
///
/// Stores every offered message so tests can assert on what would have
/// been persisted. Can be forced to fail to exercise the caller's
/// swallow-and-continue path.
#[derive(Debug, Default)]
pub struct InMemoryMessageArchive {
    stored: RwLock<Vec<StoredMessage>>,
    outage: Option<ArchiveError>,
}

impl InMemoryMessageArchive {
    /// Creates a new empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every store fail with the given error.
    pub fn with_error(mut self, error: ArchiveError) -> Self {
        self.outage = Some(error);
        self
    }

    /// Returns a copy of everything stored so far.
    pub fn stored(&self) -> Vec<StoredMessage> {
        self.stored.read().unwrap().clone()
    }

    /// Returns the number of stored messages.
    pub fn stored_count(&self) -> usize {
        self.stored.read().unwrap().len()
    }
}

#[async_trait]
impl MessageArchive for InMemoryMessageArchive {
    async fn store(
        &self,
        room: RoomId,
        sender: &UserId,
        content: &str,
    ) -> Result<(), ArchiveError> {
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }

        self.stored.write().unwrap().push(StoredMessage {
            room,
            sender: sender.clone(),
            content: content.to_string(),
        });
        Ok(())
    }
}
