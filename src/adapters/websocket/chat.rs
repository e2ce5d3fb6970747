//! The per-room chat endpoint.
//!
//! Route: `GET /ws/chat/:room_id`
//!
//! One task owns each connection for its whole life: it runs the
//! admission checks, subscribes to the room group, then serves socket
//! frames and group deliveries from a single select loop so no two
//! frames of the same connection are ever handled concurrently.

use std::borrow::Cow;
use std::collections::HashMap;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::HeaderMap,
    response::Response,
};

use crate::domain::foundation::{AuthenticatedUser, ConnectionId, RoomId};
use crate::domain::realtime::{
    sanitize_message, ChatMessageBroadcast, Group, GroupEvent, HandshakeError, InboundError,
    RoomEvent,
};
use crate::ports::Subscriber;

use super::handshake;
use super::messages::{room_event_frame, ErrorReply, InboundFrame};
use super::state::RealtimeState;

/// Handles the upgrade request for a room connection.
///
/// The admission checks run after the upgrade completes, not during
/// the HTTP exchange, so refusals can carry an application close code
/// instead of an opaque handshake failure.
pub async fn chat_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<RealtimeState>,
) -> Response {
    let token = handshake::bearer_token(&params, &headers);
    ws.on_upgrade(move |socket| chat_connection(socket, state, room_id, token))
}

/// Runs one chat connection from admission to teardown.
async fn chat_connection(
    mut socket: WebSocket,
    state: RealtimeState,
    raw_room: String,
    token: Option<String>,
) {
    let (user, room) = match handshake::admit_to_room(&state, &raw_room, token.as_deref()).await {
        Ok(admitted) => admitted,
        Err(refusal) => {
            if let HandshakeError::Unexpected(cause) = &refusal {
                tracing::error!(room = %raw_room, cause = %cause, "Chat handshake failed unexpectedly");
            }
            close_refused(&mut socket, &refusal).await;
            return;
        }
    };

    let connection_id = ConnectionId::new();
    let group = Group::chat(room);
    let (subscriber, mut deliveries) =
        Subscriber::bounded(connection_id, state.delivery_queue_capacity);

    // Joining the group is the last admission step. On failure the
    // connection closes as unexpected and no membership remains.
    if let Err(error) = state.bus.subscribe(&group, subscriber).await {
        tracing::error!(
            connection_id = %connection_id,
            group = %group,
            error = %error,
            "Chat subscription failed"
        );
        close_refused(&mut socket, &HandshakeError::unexpected(error)).await;
        return;
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user.id,
        room = %room,
        "Chat connection open"
    );

    let join = RoomEvent::PresenceJoin {
        user_id: user.id.clone(),
        display_name: user.display_identity().to_string(),
    };
    if let Err(error) = state.bus.publish(&group, join.into()).await {
        tracing::warn!(connection_id = %connection_id, error = %error, "Presence join not published");
    }

    loop {
        tokio::select! {
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_inbound(&state, &user, room, &text).await {
                            if socket.send(Message::Text(reply.to_frame())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Binary frames and protocol pings are not part
                        // of the chat protocol.
                    }
                    Some(Err(error)) => {
                        tracing::debug!(connection_id = %connection_id, error = %error, "Socket receive error");
                        break;
                    }
                }
            }
            delivery = deliveries.recv() => {
                match delivery {
                    Some(GroupEvent::Room(event)) => {
                        if socket.send(Message::Text(room_event_frame(&event))).await.is_err() {
                            break;
                        }
                    }
                    Some(other) => {
                        tracing::debug!(
                            connection_id = %connection_id,
                            kind = other.kind(),
                            "Dropped non-room event on chat connection"
                        );
                    }
                    None => {
                        // The bus evicted this connection or shut down.
                        tracing::debug!(connection_id = %connection_id, "Delivery queue closed");
                        break;
                    }
                }
            }
        }
    }

    // Teardown always runs to completion: the unsubscribe is
    // best-effort and the socket drops regardless of its outcome.
    if let Err(error) = state.bus.unsubscribe(&group, connection_id).await {
        tracing::warn!(connection_id = %connection_id, error = %error, "Unsubscribe failed during teardown");
    }
    let leave = RoomEvent::PresenceLeave {
        user_id: user.id.clone(),
    };
    if let Err(error) = state.bus.publish(&group, leave.into()).await {
        tracing::debug!(connection_id = %connection_id, error = %error, "Presence leave not published");
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user.id,
        room = %room,
        "Chat connection closed"
    );
}

/// Processes one inbound text frame.
///
/// Returns the error reply to push to the sender, if any. The
/// connection never closes over an inbound failure; internal causes
/// are logged here and the sender sees only the generic reply.
pub(crate) async fn handle_inbound(
    state: &RealtimeState,
    user: &AuthenticatedUser,
    room: RoomId,
    text: &str,
) -> Option<ErrorReply> {
    match process_frame(state, user, room, text).await {
        Ok(()) => None,
        Err(error) => {
            if let Some(cause) = error.cause() {
                tracing::error!(
                    user_id = %user.id,
                    room = %room,
                    cause = %cause,
                    "Inbound chat frame failed"
                );
            }
            Some(ErrorReply::from(&error))
        }
    }
}

async fn process_frame(
    state: &RealtimeState,
    user: &AuthenticatedUser,
    room: RoomId,
    text: &str,
) -> Result<(), InboundError> {
    match InboundFrame::parse(text)? {
        InboundFrame::Message { content } => {
            let content = sanitize_message(&content).ok_or(InboundError::EmptyMessage)?;

            // The archive is advisory: a panel outage must not stop
            // the room from talking.
            if let Err(error) = state.archive.store(room, &user.id, &content).await {
                tracing::warn!(
                    user_id = %user.id,
                    room = %room,
                    error = %error,
                    "Message not archived"
                );
            }

            let broadcast = ChatMessageBroadcast::compose(content, user, room);
            state
                .bus
                .publish(&Group::chat(room), RoomEvent::ChatMessage(broadcast).into())
                .await
                .map_err(InboundError::internal)
        }
        InboundFrame::TypingStart => state
            .bus
            .publish(
                &Group::chat(room),
                RoomEvent::TypingStart {
                    user_id: user.id.clone(),
                    display_name: user.display_identity().to_string(),
                }
                .into(),
            )
            .await
            .map_err(InboundError::internal),
        InboundFrame::TypingStop => state
            .bus
            .publish(
                &Group::chat(room),
                RoomEvent::TypingStop {
                    user_id: user.id.clone(),
                }
                .into(),
            )
            .await
            .map_err(InboundError::internal),
        InboundFrame::Ignored { kind } => {
            tracing::debug!(user_id = %user.id, room = %room, kind = %kind, "Ignored inbound frame");
            Ok(())
        }
    }
}

/// Closes a refused connection with its application close code.
pub(super) async fn close_refused(socket: &mut WebSocket, refusal: &HandshakeError) {
    let frame = CloseFrame {
        code: refusal.close_code(),
        reason: Cow::Borrowed(refusal.close_reason()),
    };
    // The peer may already be gone; the close is best-effort.
    let _ = socket.send(Message::Close(Some(frame))).await;
}
