//! MessageBus port - named-group publish/subscribe.
//!
//! This is the delivery backbone of the service: connections subscribe
//! to groups, anything may publish to a group, and the bus fans events
//! out to every current subscriber. Implementations exist in-memory
//! (single process) and over Redis (one group channel per key, shared
//! across processes).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{Group, GroupEvent};

/// Errors from the bus itself.
///
/// These cover the transport (broker connectivity, payload encoding).
/// Per-subscriber delivery failures are *not* errors: the bus swallows
/// them so one slow or dead subscriber never fails a publish.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// Broker connection failed.
    #[error("Broker unavailable: {0}")]
    Broker(String),

    /// Event could not be encoded for transport.
    #[error("Event encoding failed: {0}")]
    Encode(String),
}

/// A subscribed connection's delivery handle.
///
/// Events are queued on a bounded channel owned by the connection's
/// task; the bus never writes to sockets itself. The queue being
/// bounded is what isolates publishers from slow consumers.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: ConnectionId,
    tx: mpsc::Sender<GroupEvent>,
}

impl Subscriber {
    /// Creates a subscriber together with its delivery queue.
    pub fn bounded(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<GroupEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { id, tx }, rx)
    }

    /// The connection this subscriber belongs to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The sending half of the delivery queue.
    pub fn sender(&self) -> &mpsc::Sender<GroupEvent> {
        &self.tx
    }
}

/// Port for named-group publish/subscribe.
///
/// # Contract
///
/// - `subscribe` is idempotent: subscribing the same connection to the
///   same group twice leaves exactly one membership (one delivery per
///   published event).
/// - `unsubscribe` is idempotent: removing an unknown membership is a
///   no-op.
/// - `publish` succeeds with zero subscribers (no-op) and never fails
///   because of any individual subscriber; such failures are logged
///   and swallowed.
/// - Events from one publisher to one group reach each subscriber in
///   publish order.
/// - Implementations are safe under concurrent calls from many
///   connection tasks and never hold membership locks across await
///   points.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Adds a connection to a group.
    async fn subscribe(&self, group: &Group, subscriber: Subscriber) -> Result<(), BusError>;

    /// Removes a connection from a group.
    async fn unsubscribe(&self, group: &Group, connection: ConnectionId) -> Result<(), BusError>;

    /// Delivers an event to every current subscriber of a group.
    async fn publish(&self, group: &Group, event: GroupEvent) -> Result<(), BusError>;
}
