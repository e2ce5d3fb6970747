//! Panel service adapters.
//!
//! The panel owns room records, memberships, and message history. These
//! adapters implement the `RoomAccess` and `MessageArchive` ports against
//! its internal HTTP API:
//!
//! - `PanelRoomAccess` - Production access predicate
//! - `PanelMessageArchive` - Production message sink
//! - `MockRoomAccess` / `InMemoryMessageArchive` - Test implementations

mod access;
mod archive;
mod config;
mod mock;

pub use access::PanelRoomAccess;
pub use archive::PanelMessageArchive;
pub use config::PanelClientConfig;
pub use mock::{InMemoryMessageArchive, MockRoomAccess, StoredMessage};
