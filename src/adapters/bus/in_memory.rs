//! In-memory MessageBus for single-process deployments and tests.
//!
//! Fan-out happens directly through the local [`GroupRegistry`]; there
//! is no broker and no cross-process visibility. This is the default
//! driver for development and the workhorse of the integration tests.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{Group, GroupEvent};
use crate::ports::{BusError, MessageBus, Subscriber};

use super::registry::GroupRegistry;

/// MessageBus backed by the local registry only.
#[derive(Debug, Default)]
pub struct InMemoryMessageBus {
    registry: GroupRegistry,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members currently in a group.
    pub async fn member_count(&self, group: &Group) -> usize {
        self.registry.member_count(group).await
    }

    /// Whether a connection is currently subscribed to a group.
    pub async fn is_member(&self, group: &Group, connection: ConnectionId) -> bool {
        self.registry.is_member(group, connection).await
    }

    /// Number of groups with at least one member.
    pub async fn group_count(&self) -> usize {
        self.registry.group_count().await
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn subscribe(&self, group: &Group, subscriber: Subscriber) -> Result<(), BusError> {
        let connection_id = subscriber.id();
        self.registry.insert(group, subscriber).await;
        debug!(group = %group, connection_id = %connection_id, "Subscribed");
        Ok(())
    }

    async fn unsubscribe(&self, group: &Group, connection: ConnectionId) -> Result<(), BusError> {
        self.registry.remove(group, connection).await;
        debug!(group = %group, connection_id = %connection, "Unsubscribed");
        Ok(())
    }

    async fn publish(&self, group: &Group, event: GroupEvent) -> Result<(), BusError> {
        let summary = self.registry.deliver(group, &event).await;
        debug!(
            group = %group,
            kind = event.kind(),
            delivered = summary.delivered,
            "Published event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RoomId, UserId};
    use crate::domain::realtime::RoomEvent;

    fn typing_stop(user: &str) -> GroupEvent {
        GroupEvent::from(RoomEvent::TypingStop {
            user_id: UserId::new(user).unwrap(),
        })
    }

    fn chat_group() -> Group {
        Group::chat(RoomId::new(42))
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = InMemoryMessageBus::new();
        let (subscriber, mut rx) = Subscriber::bounded(ConnectionId::new(), 8);
        bus.subscribe(&chat_group(), subscriber).await.unwrap();

        bus.publish(&chat_group(), typing_stop("u-1")).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), "typing_stop");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let bus = InMemoryMessageBus::new();
        let result = bus.publish(&chat_group(), typing_stop("u-1")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn double_subscribe_delivers_once() {
        let bus = InMemoryMessageBus::new();
        let id = ConnectionId::new();
        let (subscriber, mut rx) = Subscriber::bounded(id, 8);

        bus.subscribe(&chat_group(), subscriber.clone()).await.unwrap();
        bus.subscribe(&chat_group(), subscriber).await.unwrap();
        bus.publish(&chat_group(), typing_stop("u-1")).await.unwrap();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = InMemoryMessageBus::new();
        let id = ConnectionId::new();
        let (subscriber, mut rx) = Subscriber::bounded(id, 8);
        bus.subscribe(&chat_group(), subscriber).await.unwrap();

        bus.unsubscribe(&chat_group(), id).await.unwrap();
        bus.publish(&chat_group(), typing_stop("u-1")).await.unwrap();

        assert!(rx.try_recv().is_err());
        assert_eq!(bus.member_count(&chat_group()).await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_unknown_connection_is_a_noop() {
        let bus = InMemoryMessageBus::new();
        let result = bus.unsubscribe(&chat_group(), ConnectionId::new()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = InMemoryMessageBus::new();
        let (subscriber, mut rx) = Subscriber::bounded(ConnectionId::new(), 16);
        bus.subscribe(&chat_group(), subscriber).await.unwrap();

        for user in ["u-1", "u-2", "u-3"] {
            bus.publish(&chat_group(), typing_stop(user)).await.unwrap();
        }

        for expected in ["u-1", "u-2", "u-3"] {
            match rx.recv().await.unwrap() {
                GroupEvent::Room(RoomEvent::TypingStop { user_id }) => {
                    assert_eq!(user_id.as_str(), expected);
                }
                other => panic!("Unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn groups_are_isolated_from_each_other() {
        let bus = InMemoryMessageBus::new();
        let (room_sub, mut room_rx) = Subscriber::bounded(ConnectionId::new(), 8);
        let (other_sub, mut other_rx) = Subscriber::bounded(ConnectionId::new(), 8);
        bus.subscribe(&chat_group(), room_sub).await.unwrap();
        bus.subscribe(&Group::chat(RoomId::new(43)), other_sub)
            .await
            .unwrap();

        bus.publish(&chat_group(), typing_stop("u-1")).await.unwrap();

        assert!(room_rx.try_recv().is_ok());
        assert!(other_rx.try_recv().is_err());
    }
}
