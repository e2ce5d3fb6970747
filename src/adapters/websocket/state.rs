//! Shared state for the realtime endpoints.

use std::sync::Arc;

use crate::ports::{MessageArchive, MessageBus, RoomAccess, SessionValidator};

/// Default capacity of each connection's delivery queue.
pub const DEFAULT_DELIVERY_QUEUE_CAPACITY: usize = 256;

/// Everything a realtime connection needs, shared across handlers.
///
/// All ports are behind `Arc<dyn ...>` so the same router wiring serves
/// production adapters and in-memory test doubles.
#[derive(Clone)]
pub struct RealtimeState {
    /// Group fan-out for room and notification traffic.
    pub bus: Arc<dyn MessageBus>,

    /// Token validation for the handshake.
    pub sessions: Arc<dyn SessionValidator>,

    /// Room membership predicate.
    pub access: Arc<dyn RoomAccess>,

    /// Persistence for accepted chat messages.
    pub archive: Arc<dyn MessageArchive>,

    /// Capacity of each connection's delivery queue.
    pub delivery_queue_capacity: usize,
}

impl RealtimeState {
    /// Creates state with the default delivery queue capacity.
    pub fn new(
        bus: Arc<dyn MessageBus>,
        sessions: Arc<dyn SessionValidator>,
        access: Arc<dyn RoomAccess>,
        archive: Arc<dyn MessageArchive>,
    ) -> Self {
        Self {
            bus,
            sessions,
            access,
            archive,
            delivery_queue_capacity: DEFAULT_DELIVERY_QUEUE_CAPACITY,
        }
    }

    /// Overrides the per-connection delivery queue capacity.
    pub fn with_delivery_queue_capacity(mut self, capacity: usize) -> Self {
        self.delivery_queue_capacity = capacity;
        self
    }
}
