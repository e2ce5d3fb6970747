//! Redis-backed MessageBus for multi-process deployments.
//!
//! Every group maps to one broker channel (`roomcast:<group key>`).
//! Publishing always goes through the broker, including for local
//! subscribers, so every process observes one consistent event order. A
//! single relay task owns the pub/sub connection: it opens a broker
//! subscription when a group gains its first local member, drops it when
//! the last one leaves, and fans incoming frames out through the local
//! [`GroupRegistry`].
//!
//! Frames on channels this service does not route, and frames that fail
//! to decode, are dropped with a log line rather than poisoning the
//! relay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{Group, GroupEvent, NotificationEvent, RoomEvent};
use crate::ports::{BusError, MessageBus, Subscriber};

use super::registry::GroupRegistry;

/// Prefix for every broker channel this service uses.
const CHANNEL_NAMESPACE: &str = "roomcast";

/// Pause between broker reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

fn channel_name(group_key: &str) -> String {
    format!("{}:{}", CHANNEL_NAMESPACE, group_key)
}

fn group_from_channel(channel: &str) -> Option<Group> {
    let key = channel
        .strip_prefix(CHANNEL_NAMESPACE)?
        .strip_prefix(':')?;
    Group::from_key(key)
}

/// Decodes a broker payload into the event type its group carries.
///
/// The group key picks the union: chat and notification events share
/// `"type"` tag values, so the channel is the only safe discriminator.
fn decode_event(group: &Group, payload: &str) -> Result<GroupEvent, serde_json::Error> {
    match group {
        Group::Chat(_) => serde_json::from_str::<RoomEvent>(payload).map(GroupEvent::from),
        Group::Notifications => {
            serde_json::from_str::<NotificationEvent>(payload).map(GroupEvent::from)
        }
    }
}

enum SubscriptionCommand {
    Subscribe(String),
    Unsubscribe(String),
}

enum RelayAction {
    Command(SubscriptionCommand),
    Deliver(redis::Msg),
    Disconnected,
    Shutdown,
}

/// MessageBus that fans out through Redis pub/sub.
#[derive(Clone)]
pub struct RedisMessageBus {
    conn: MultiplexedConnection,
    registry: Arc<GroupRegistry>,
    commands: mpsc::UnboundedSender<SubscriptionCommand>,
}

impl RedisMessageBus {
    /// Connects to the broker and spawns the relay task.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url).map_err(|e| BusError::Broker(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| BusError::Broker(e.to_string()))?;

        let registry = Arc::new(GroupRegistry::new());
        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(relay_loop(client, Arc::clone(&registry), command_rx));

        Ok(Self {
            conn,
            registry,
            commands,
        })
    }

    /// Number of local members currently in a group.
    pub async fn member_count(&self, group: &Group) -> usize {
        self.registry.member_count(group).await
    }
}

#[async_trait]
impl MessageBus for RedisMessageBus {
    async fn subscribe(&self, group: &Group, subscriber: Subscriber) -> Result<(), BusError> {
        let connection_id = subscriber.id();
        let opened = self.registry.insert(group, subscriber).await;
        if opened {
            self.commands
                .send(SubscriptionCommand::Subscribe(channel_name(&group.key())))
                .map_err(|_| BusError::Broker("subscription relay has shut down".to_string()))?;
        }
        debug!(group = %group, connection_id = %connection_id, "Subscribed");
        Ok(())
    }

    async fn unsubscribe(&self, group: &Group, connection: ConnectionId) -> Result<(), BusError> {
        let emptied = self.registry.remove(group, connection).await;
        if emptied {
            // Best effort: a dead relay has no broker traffic to stop.
            let _ = self
                .commands
                .send(SubscriptionCommand::Unsubscribe(channel_name(&group.key())));
        }
        debug!(group = %group, connection_id = %connection, "Unsubscribed");
        Ok(())
    }

    async fn publish(&self, group: &Group, event: GroupEvent) -> Result<(), BusError> {
        let payload =
            serde_json::to_string(&event).map_err(|e| BusError::Encode(e.to_string()))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(channel_name(&group.key()), payload)
            .await
            .map_err(|e: redis::RedisError| BusError::Broker(e.to_string()))?;

        debug!(
            group = %group,
            kind = event.kind(),
            receivers,
            "Published event to broker"
        );
        Ok(())
    }
}

impl std::fmt::Debug for RedisMessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisMessageBus")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Owns the pub/sub connection for the life of the bus.
///
/// Exits when the bus (and with it the command channel) is dropped.
/// On broker failure it reconnects and restores a subscription for
/// every group that still has local members.
async fn relay_loop(
    client: redis::Client,
    registry: Arc<GroupRegistry>,
    mut commands: mpsc::UnboundedReceiver<SubscriptionCommand>,
) {
    loop {
        let mut pubsub = match client.get_async_connection().await {
            Ok(conn) => conn.into_pubsub(),
            Err(err) => {
                error!(error = %err, "Broker connection failed, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };

        let mut restored = true;
        for key in registry.group_keys().await {
            let channel = channel_name(&key);
            if let Err(err) = pubsub.subscribe(&channel).await {
                error!(channel, error = %err, "Broker resubscribe failed");
                restored = false;
                break;
            }
        }
        if !restored {
            tokio::time::sleep(RECONNECT_DELAY).await;
            continue;
        }

        loop {
            // The message stream borrows the pub/sub connection, so the
            // borrow is scoped here and released before any subscribe
            // or unsubscribe below.
            let action = {
                let mut stream = pubsub.on_message();
                tokio::select! {
                    command = commands.recv() => match command {
                        Some(command) => RelayAction::Command(command),
                        None => RelayAction::Shutdown,
                    },
                    frame = stream.next() => match frame {
                        Some(frame) => RelayAction::Deliver(frame),
                        None => RelayAction::Disconnected,
                    },
                }
            };

            match action {
                RelayAction::Command(SubscriptionCommand::Subscribe(channel)) => {
                    if let Err(err) = pubsub.subscribe(&channel).await {
                        error!(channel, error = %err, "Broker subscribe failed");
                    }
                }
                RelayAction::Command(SubscriptionCommand::Unsubscribe(channel)) => {
                    if let Err(err) = pubsub.unsubscribe(&channel).await {
                        debug!(channel, error = %err, "Broker unsubscribe failed");
                    }
                }
                RelayAction::Deliver(frame) => {
                    if let Some(emptied) = relay_frame(&registry, frame).await {
                        let _ = pubsub.unsubscribe(&emptied).await;
                    }
                }
                RelayAction::Disconnected => {
                    warn!("Broker subscription stream ended, reconnecting");
                    break;
                }
                RelayAction::Shutdown => return,
            }
        }
    }
}

/// Routes one broker frame into the local registry.
///
/// Returns the channel to drop when eviction emptied its group.
async fn relay_frame(registry: &GroupRegistry, frame: redis::Msg) -> Option<String> {
    let channel = frame.get_channel_name().to_string();
    let Some(group) = group_from_channel(&channel) else {
        debug!(channel, "Ignoring frame on foreign channel");
        return None;
    };

    let payload: String = match frame.get_payload() {
        Ok(payload) => payload,
        Err(err) => {
            warn!(channel, error = %err, "Dropping unreadable broker frame");
            return None;
        }
    };

    let event = match decode_event(&group, &payload) {
        Ok(event) => event,
        Err(err) => {
            warn!(channel, error = %err, "Dropping undecodable broker frame");
            return None;
        }
    };

    let summary = registry.deliver(&group, &event).await;
    debug!(
        group = %group,
        kind = event.kind(),
        delivered = summary.delivered,
        "Relayed broker event"
    );
    summary.emptied.then_some(channel)
}
