//! RoomAccess port - the room membership predicate.
//!
//! Room records and their member lists live in the panel service; this
//! port is how the realtime layer asks whether an authenticated user may
//! join a room. A nonexistent room answers `false` (there is nothing to
//! access), which is why the handshake treats it as a permission
//! failure rather than a lookup error.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{RoomId, UserId};

/// Errors while evaluating room access.
///
/// A clean denial is `Ok(false)`, not an error. Errors mean the answer
/// is unknown; the handshake fails closed on them.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The access service could not be reached.
    #[error("Access service unavailable: {0}")]
    Unavailable(String),

    /// The access service answered with something unusable.
    #[error("Access service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Port for the room access predicate.
#[async_trait]
pub trait RoomAccess: Send + Sync {
    /// Returns whether the user may join the room.
    async fn can_access(&self, user: &UserId, room: RoomId) -> Result<bool, AccessError>;
}
