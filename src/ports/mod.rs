//! Ports layer - trait contracts between the realtime core and the
//! outside world.
//!
//! Each port names one external concern: event delivery, identity,
//! room authorization, and message persistence. Adapters implement
//! them; the websocket layer only ever sees the traits.

mod message_archive;
mod message_bus;
mod room_access;
mod session_validator;

pub use message_archive::{ArchiveError, MessageArchive};
pub use message_bus::{BusError, MessageBus, Subscriber};
pub use room_access::{AccessError, RoomAccess};
pub use session_validator::SessionValidator;
