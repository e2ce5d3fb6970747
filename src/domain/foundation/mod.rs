//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the roomcast domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::ValidationError;
pub use ids::{room_id_string, ConnectionId, RoomId, UserId};
pub use timestamp::Timestamp;
