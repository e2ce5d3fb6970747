//! MessageArchive port - the sink for persisted chat messages.
//!
//! Persistence belongs to the panel service; the realtime layer only
//! offers each sanitized message to this sink before broadcasting it.
//! Archiving is best-effort: a failed store is logged by the caller and
//! the broadcast proceeds, so a persistence outage never silences a
//! room.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{RoomId, UserId};

/// Errors while storing a message record.
#[derive(Debug, Clone, Error)]
pub enum ArchiveError {
    /// The archive service could not be reached.
    #[error("Archive unavailable: {0}")]
    Unavailable(String),

    /// The archive refused the record.
    #[error("Archive rejected the message: {0}")]
    Rejected(String),
}

/// Port for the chat message sink.
#[async_trait]
pub trait MessageArchive: Send + Sync {
    /// Offers one sanitized message for persistence.
    async fn store(&self, room: RoomId, sender: &UserId, content: &str)
        -> Result<(), ArchiveError>;
}
