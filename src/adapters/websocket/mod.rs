//! WebSocket endpoints for rooms and notifications.
//!
//! This module owns the connection lifecycle: upgrade, admission,
//! group membership, frame handling, and teardown.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Message Bus                                  │
//! │   InMemoryMessageBus (single process) │ RedisMessageBus (fleet)     │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │ group: chat_42                      │ group: notifications
//!          ▼                                     ▼
//! ┌──────────────────────────────┐  ┌─────────────────────────────────┐
//! │   /ws/chat/:room_id          │  │   /ws/notifications             │
//! │   - admission checks, close  │  │   - identity only, plain close  │
//! │     4000/4001 on refusal     │  │     on anonymous                │
//! │   - inbound messages, typing │  │   - push only                   │
//! │   - broadcasts to the room   │  │   - self-originated notices     │
//! │     (sender included)        │  │     suppressed per recipient    │
//! └──────────────────────────────┘  └─────────────────────────────────┘
//! ```
//!
//! One task owns each connection end to end; the bus hands events to
//! the task over a bounded queue and never touches the socket.
//!
//! # Components
//!
//! - `messages` - frame parsing and serialization
//! - `handshake` - token extraction and admission checks
//! - `chat` - the per-room endpoint
//! - `notifications` - the per-user notification endpoint

mod chat;
mod handshake;
mod messages;
mod notifications;
mod state;

use axum::routing::get;
use axum::Router;

pub use chat::chat_handler;
pub use notifications::notifications_handler;
pub use state::RealtimeState;

/// Builds the realtime routes.
///
/// ```ignore
/// let app = Router::new()
///     .nest("/ws", realtime_router())
///     .with_state(realtime_state);
/// ```
pub fn realtime_router() -> Router<RealtimeState> {
    Router::new()
        .route("/chat/:room_id", get(chat_handler))
        .route("/notifications", get(notifications_handler))
}
