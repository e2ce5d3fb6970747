//! Local fan-out table shared by the bus implementations.
//!
//! Maps group keys to the delivery handles of locally connected
//! subscribers. The in-memory bus publishes straight into it; the Redis
//! bus relays broker frames into it. All methods take the membership
//! lock for sync work only and release it before any delivery, so no
//! lock is ever held across an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{Group, GroupEvent};
use crate::ports::Subscriber;

/// Queued-event drops a membership may accumulate before eviction.
///
/// A consumer that persistently cannot drain its queue is effectively
/// dead; evicting it closes its delivery channel, which its connection
/// task observes and turns into a disconnect.
pub const MAX_DELIVERY_DROPS: u64 = 100;

/// One connection's membership in one group.
#[derive(Debug)]
struct Membership {
    subscriber: Subscriber,
    dropped: AtomicU64,
}

impl Membership {
    fn new(subscriber: Subscriber) -> Arc<Self> {
        Arc::new(Self {
            subscriber,
            dropped: AtomicU64::new(0),
        })
    }
}

/// What one delivery pass did.
#[derive(Debug, Default)]
pub struct DeliverySummary {
    /// Subscribers whose queues accepted the event.
    pub delivered: usize,
    /// Subscribers evicted during this pass (queue closed or drop
    /// ceiling reached).
    pub evicted: Vec<ConnectionId>,
    /// Whether eviction left the group without members.
    pub emptied: bool,
}

/// Group membership table.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, HashMap<ConnectionId, Arc<Membership>>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a membership, replacing any previous entry for the same
    /// connection (idempotent subscribe).
    ///
    /// Returns `true` when this created the group, which is the Redis
    /// bus's cue to open a broker subscription.
    pub async fn insert(&self, group: &Group, subscriber: Subscriber) -> bool {
        let key = group.key();
        let mut groups = self.groups.write().await;
        let created = !groups.contains_key(&key);
        groups
            .entry(key)
            .or_default()
            .insert(subscriber.id(), Membership::new(subscriber));
        created
    }

    /// Removes a membership if present (idempotent unsubscribe).
    ///
    /// Returns `true` when the group lost its last member and was
    /// dropped from the table.
    pub async fn remove(&self, group: &Group, connection: ConnectionId) -> bool {
        let key = group.key();
        let mut groups = self.groups.write().await;
        let Some(members) = groups.get_mut(&key) else {
            return false;
        };
        if members.remove(&connection).is_none() {
            return false;
        }
        if members.is_empty() {
            groups.remove(&key);
            return true;
        }
        false
    }

    /// Fans one event out to every member of a group.
    ///
    /// Handles are snapshotted under the read lock, then the lock is
    /// released before any queue is touched. Delivery is non-blocking:
    /// a full queue drops the event for that member only and counts
    /// against its drop ceiling. Members whose queue is closed, or who
    /// hit the ceiling, are evicted afterwards.
    pub async fn deliver(&self, group: &Group, event: &GroupEvent) -> DeliverySummary {
        let key = group.key();
        let members: Vec<(ConnectionId, Arc<Membership>)> = {
            let groups = self.groups.read().await;
            match groups.get(&key) {
                Some(members) => members
                    .iter()
                    .map(|(id, membership)| (*id, Arc::clone(membership)))
                    .collect(),
                None => Vec::new(),
            }
        };

        let mut summary = DeliverySummary::default();
        for (id, membership) in &members {
            match membership.subscriber.sender().try_send(event.clone()) {
                Ok(()) => summary.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    let drops = membership.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        connection_id = %id,
                        group = %group,
                        drops,
                        "Delivery queue full, dropping event"
                    );
                    if drops >= MAX_DELIVERY_DROPS {
                        summary.evicted.push(*id);
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection_id = %id, group = %group, "Delivery queue closed");
                    summary.evicted.push(*id);
                }
            }
        }

        if !summary.evicted.is_empty() {
            let mut groups = self.groups.write().await;
            if let Some(members) = groups.get_mut(&key) {
                for id in &summary.evicted {
                    members.remove(id);
                }
                if members.is_empty() {
                    groups.remove(&key);
                    summary.emptied = true;
                }
            }
            for id in &summary.evicted {
                warn!(connection_id = %id, group = %group, "Evicted unresponsive subscriber");
            }
        }

        summary
    }

    /// Number of members currently in a group.
    pub async fn member_count(&self, group: &Group) -> usize {
        self.groups
            .read()
            .await
            .get(&group.key())
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Whether a connection is a member of a group.
    pub async fn is_member(&self, group: &Group, connection: ConnectionId) -> bool {
        self.groups
            .read()
            .await
            .get(&group.key())
            .map(|members| members.contains_key(&connection))
            .unwrap_or(false)
    }

    /// Keys of every group with at least one member.
    ///
    /// Used by the Redis bus to restore broker subscriptions after a
    /// reconnect.
    pub async fn group_keys(&self) -> Vec<String> {
        self.groups.read().await.keys().cloned().collect()
    }

    /// Total number of groups with members.
    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
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
    async fn insert_reports_group_creation_once() {
        let registry = GroupRegistry::new();
        let (first, _rx1) = Subscriber::bounded(ConnectionId::new(), 8);
        let (second, _rx2) = Subscriber::bounded(ConnectionId::new(), 8);

        assert!(registry.insert(&chat_group(), first).await);
        assert!(!registry.insert(&chat_group(), second).await);
        assert_eq!(registry.member_count(&chat_group()).await, 2);
    }

    #[tokio::test]
    async fn insert_is_idempotent_per_connection() {
        let registry = GroupRegistry::new();
        let id = ConnectionId::new();
        let (subscriber, _rx) = Subscriber::bounded(id, 8);

        registry.insert(&chat_group(), subscriber.clone()).await;
        registry.insert(&chat_group(), subscriber).await;

        assert_eq!(registry.member_count(&chat_group()).await, 1);
    }

    #[tokio::test]
    async fn remove_reports_when_group_empties() {
        let registry = GroupRegistry::new();
        let id = ConnectionId::new();
        let (subscriber, _rx) = Subscriber::bounded(id, 8);
        registry.insert(&chat_group(), subscriber).await;

        assert!(registry.remove(&chat_group(), id).await);
        assert_eq!(registry.group_count().await, 0);
    }

    #[tokio::test]
    async fn remove_unknown_membership_is_noop() {
        let registry = GroupRegistry::new();
        assert!(!registry.remove(&chat_group(), ConnectionId::new()).await);

        let id = ConnectionId::new();
        let (subscriber, _rx) = Subscriber::bounded(id, 8);
        registry.insert(&chat_group(), subscriber).await;
        assert!(!registry.remove(&chat_group(), ConnectionId::new()).await);
        assert_eq!(registry.member_count(&chat_group()).await, 1);
    }

    #[tokio::test]
    async fn deliver_reaches_every_member() {
        let registry = GroupRegistry::new();
        let (sub_a, mut rx_a) = Subscriber::bounded(ConnectionId::new(), 8);
        let (sub_b, mut rx_b) = Subscriber::bounded(ConnectionId::new(), 8);
        registry.insert(&chat_group(), sub_a).await;
        registry.insert(&chat_group(), sub_b).await;

        let summary = registry.deliver(&chat_group(), &typing_stop("u-1")).await;

        assert_eq!(summary.delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn deliver_to_empty_group_is_noop() {
        let registry = GroupRegistry::new();
        let summary = registry.deliver(&chat_group(), &typing_stop("u-1")).await;
        assert_eq!(summary.delivered, 0);
        assert!(summary.evicted.is_empty());
    }

    #[tokio::test]
    async fn full_queue_drops_for_that_member_only() {
        let registry = GroupRegistry::new();
        let (slow, _slow_rx) = Subscriber::bounded(ConnectionId::new(), 1);
        let (healthy, mut healthy_rx) = Subscriber::bounded(ConnectionId::new(), 8);
        registry.insert(&chat_group(), slow).await;
        registry.insert(&chat_group(), healthy).await;

        // First event fills the slow queue; second overflows it.
        registry.deliver(&chat_group(), &typing_stop("u-1")).await;
        let summary = registry.deliver(&chat_group(), &typing_stop("u-2")).await;

        assert_eq!(summary.delivered, 1);
        assert!(summary.evicted.is_empty());
        assert!(healthy_rx.try_recv().is_ok());
        assert!(healthy_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn closed_queue_evicts_the_member() {
        let registry = GroupRegistry::new();
        let id = ConnectionId::new();
        let (subscriber, rx) = Subscriber::bounded(id, 8);
        registry.insert(&chat_group(), subscriber).await;
        drop(rx);

        let summary = registry.deliver(&chat_group(), &typing_stop("u-1")).await;

        assert_eq!(summary.evicted, vec![id]);
        assert!(summary.emptied);
        assert_eq!(registry.member_count(&chat_group()).await, 0);
    }

    #[tokio::test]
    async fn drop_ceiling_evicts_persistently_slow_member() {
        let registry = GroupRegistry::new();
        let id = ConnectionId::new();
        let (subscriber, _rx) = Subscriber::bounded(id, 1);
        registry.insert(&chat_group(), subscriber).await;

        // Queue holds one event; every further delivery is a drop.
        for _ in 0..=MAX_DELIVERY_DROPS {
            registry.deliver(&chat_group(), &typing_stop("u-1")).await;
        }

        assert_eq!(registry.member_count(&chat_group()).await, 0);
    }

    #[tokio::test]
    async fn group_keys_lists_active_groups() {
        let registry = GroupRegistry::new();
        let (sub_a, _rx_a) = Subscriber::bounded(ConnectionId::new(), 8);
        let (sub_b, _rx_b) = Subscriber::bounded(ConnectionId::new(), 8);
        registry.insert(&chat_group(), sub_a).await;
        registry.insert(&Group::Notifications, sub_b).await;

        let mut keys = registry.group_keys().await;
        keys.sort();
        assert_eq!(keys, vec!["chat_42".to_string(), "notifications".to_string()]);
    }
}
