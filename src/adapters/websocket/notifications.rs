//! The per-user notification endpoint.
//!
//! Route: `GET /ws/notifications`
//!
//! Every authenticated connection joins the single process-wide
//! `notifications` group. Message notices are filtered per recipient
//! so nobody is notified about their own messages; system notices go
//! to everyone. The filter only decides delivery - the event itself is
//! shared and never rewritten for one recipient.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};

use crate::domain::foundation::{AuthenticatedUser, ConnectionId};
use crate::domain::realtime::{Group, GroupEvent, NotificationEvent};
use crate::ports::Subscriber;

use super::handshake;
use super::messages::notification_frame;
use super::state::RealtimeState;

/// Handles the upgrade request for a notification connection.
pub async fn notifications_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<RealtimeState>,
) -> Response {
    let token = handshake::bearer_token(&params, &headers);
    ws.on_upgrade(move |socket| notification_connection(socket, state, token))
}

/// Runs one notification connection from admission to teardown.
///
/// The only admission check here is identity: an anonymous connection
/// is closed immediately, with a plain close frame rather than an
/// application code.
async fn notification_connection(
    mut socket: WebSocket,
    state: RealtimeState,
    token: Option<String>,
) {
    let user = match handshake::resolve_identity(&state, token.as_deref()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Rejected anonymous notification connection");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
        Err(refusal) => {
            tracing::error!(error = %refusal, "Notification handshake failed unexpectedly");
            super::chat::close_refused(&mut socket, &refusal).await;
            return;
        }
    };

    let connection_id = ConnectionId::new();
    let (subscriber, mut deliveries) =
        Subscriber::bounded(connection_id, state.delivery_queue_capacity);

    if let Err(error) = state
        .bus
        .subscribe(&Group::Notifications, subscriber)
        .await
    {
        tracing::error!(
            connection_id = %connection_id,
            error = %error,
            "Notification subscription failed"
        );
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user.id,
        "Notification connection open"
    );

    loop {
        tokio::select! {
            frame = socket.recv() => {
                match frame {
                    // This endpoint is push-only; client text is noise.
                    Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::debug!(connection_id = %connection_id, error = %error, "Socket receive error");
                        break;
                    }
                }
            }
            delivery = deliveries.recv() => {
                match delivery {
                    Some(GroupEvent::Notification(event)) => {
                        if !should_deliver(&event, &user) {
                            tracing::debug!(
                                connection_id = %connection_id,
                                user_id = %user.id,
                                kind = event.kind(),
                                "Suppressed self-originated notice"
                            );
                            continue;
                        }
                        if socket.send(Message::Text(notification_frame(&event))).await.is_err() {
                            break;
                        }
                    }
                    Some(other) => {
                        tracing::debug!(
                            connection_id = %connection_id,
                            kind = other.kind(),
                            "Dropped non-notification event on notification connection"
                        );
                    }
                    None => {
                        tracing::debug!(connection_id = %connection_id, "Delivery queue closed");
                        break;
                    }
                }
            }
        }
    }

    if let Err(error) = state
        .bus
        .unsubscribe(&Group::Notifications, connection_id)
        .await
    {
        tracing::warn!(connection_id = %connection_id, error = %error, "Unsubscribe failed during teardown");
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user.id,
        "Notification connection closed"
    );
}

/// Decides whether a notice reaches this recipient.
///
/// Message notices are suppressed when the recipient is the user the
/// notice originated from; system notices always deliver.
pub(crate) fn should_deliver(event: &NotificationEvent, recipient: &AuthenticatedUser) -> bool {
    match event.origin_user() {
        Some(origin) => *origin != recipient.id,
        None => true,
    }
}
