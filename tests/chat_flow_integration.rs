//! Integration tests for the chat WebSocket lifecycle.
//!
//! These tests boot the realtime router on a loopback listener and drive
//! it with real WebSocket clients, covering the full path:
//!
//! 1. Admission: room id validation, then identity, then room access
//! 2. Refusals close with 4000/4001 before any group membership exists
//! 3. Accepted connections join the room group and exchange broadcasts
//! 4. Inbound rules: truncation, sender-only error replies, ordering
//! 5. Disconnects tear the membership back down

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use roomcast::adapters::auth::MockSessionValidator;
use roomcast::adapters::bus::InMemoryMessageBus;
use roomcast::adapters::panel::{InMemoryMessageArchive, MockRoomAccess};
use roomcast::adapters::websocket::{realtime_router, RealtimeState};
use roomcast::domain::foundation::RoomId;
use roomcast::domain::realtime::Group;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// ============================================================================
// Test Infrastructure
// ============================================================================

struct TestServer {
    base: String,
    bus: Arc<InMemoryMessageBus>,
    archive: Arc<InMemoryMessageArchive>,
}

impl TestServer {
    fn chat_url(&self, room: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("{}/chat/{room}?token={token}", self.base),
            None => format!("{}/chat/{room}", self.base),
        }
    }
}

/// Boots the realtime router with in-memory adapters on an ephemeral port.
///
/// Tokens `tok-a`, `tok-b` and `tok-c` resolve to users `u-a`, `u-b` and
/// `u-c`. All three are members of room 42; only `u-a` may enter room 7.
async fn boot_server() -> TestServer {
    let bus = Arc::new(InMemoryMessageBus::new());
    let archive = Arc::new(InMemoryMessageArchive::new());

    let sessions = MockSessionValidator::new()
        .with_test_user("tok-a", "u-a")
        .with_test_user("tok-b", "u-b")
        .with_test_user("tok-c", "u-c");
    let access = MockRoomAccess::new()
        .with_member("u-a", RoomId::new(42))
        .with_member("u-b", RoomId::new(42))
        .with_member("u-c", RoomId::new(42))
        .with_member("u-a", RoomId::new(7));

    let state = RealtimeState::new(
        bus.clone(),
        Arc::new(sessions),
        Arc::new(access),
        archive.clone(),
    );
    let app = Router::new()
        .nest("/ws", realtime_router())
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("ws://{addr}/ws"),
        bus,
        archive,
    }
}

async fn connect(url: &str) -> WsStream {
    let (ws, _) = connect_async(url).await.expect("websocket handshake failed");
    ws
}

/// Connects to a chat room and waits for the caller's own presence join,
/// which confirms the subscription is live before the test proceeds.
async fn join_room(server: &TestServer, room: &str, token: &str, user_id: &str) -> WsStream {
    let mut ws = connect(&server.chat_url(room, Some(token))).await;
    read_until(&mut ws, |frame| {
        frame["type"] == "presence_join" && frame["user_id"] == user_id
    })
    .await;
    ws
}

async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Reads the next text frame as JSON, skipping protocol frames.
async fn read_json(ws: &mut WsStream) -> Value {
    loop {
        let message = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed while waiting for a frame")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("frame is not valid JSON");
        }
    }
}

/// Reads text frames until one matches the predicate.
async fn read_until(ws: &mut WsStream, matches: impl Fn(&Value) -> bool) -> Value {
    loop {
        let frame = read_json(ws).await;
        if matches(&frame) {
            return frame;
        }
    }
}

/// Reads until the next chat broadcast. Broadcasts are the only frames
/// without a `type` tag; presence and typing frames carry one.
async fn read_broadcast(ws: &mut WsStream) -> Value {
    read_until(ws, |frame| frame.get("type").is_none()).await
}

/// Returns the next text frame within the quiet period, or `None` when
/// the connection stays silent.
async fn try_read_json(ws: &mut WsStream) -> Option<Value> {
    let received = timeout(QUIET_PERIOD, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    })
    .await;
    match received {
        Ok(Some(text)) => Some(serde_json::from_str(&text).expect("frame is not valid JSON")),
        _ => None,
    }
}

/// Drains frames until the server closes, returning the close code if any.
async fn read_close_code(ws: &mut WsStream) -> Option<u16> {
    loop {
        let message = match timeout(RECV_TIMEOUT, ws.next()).await {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(_))) | Ok(None) => return None,
            Err(_) => panic!("timed out waiting for the server to close"),
        };
        if let Message::Close(frame) = message {
            return frame.map(|frame| u16::from(frame.code));
        }
    }
}

/// Polls the bus until the group reaches the expected member count.
async fn wait_for_members(server: &TestServer, group: &Group, expected: usize) {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    loop {
        if server.bus.member_count(group).await == expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "group {} never reached {expected} members",
            group.key()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ============================================================================
// Admission
// ============================================================================

/// A room id with non-digit characters is refused with close code 4000
/// before the connection ever touches the bus.
#[tokio::test]
async fn non_numeric_room_is_closed_with_4000() {
    let server = boot_server().await;

    let mut ws = connect(&server.chat_url("lobby", Some("tok-a"))).await;

    assert_eq!(read_close_code(&mut ws).await, Some(4000));
    assert_eq!(server.bus.group_count().await, 0);
}

/// A connection with no token is refused with 4001, and the refusal
/// happens before any subscription is registered.
#[tokio::test]
async fn anonymous_connection_is_closed_with_4001() {
    let server = boot_server().await;

    let mut ws = connect(&server.chat_url("42", None)).await;

    assert_eq!(read_close_code(&mut ws).await, Some(4001));
    assert_eq!(server.bus.group_count().await, 0);
}

/// An unknown token resolves to no identity and is refused like a
/// missing one.
#[tokio::test]
async fn unknown_token_is_closed_with_4001() {
    let server = boot_server().await;

    let mut ws = connect(&server.chat_url("42", Some("tok-forged"))).await;

    assert_eq!(read_close_code(&mut ws).await, Some(4001));
    assert_eq!(server.bus.group_count().await, 0);
}

/// An authenticated user outside the room's membership is refused with
/// 4001 and never joins the room group.
#[tokio::test]
async fn non_member_is_closed_with_4001() {
    let server = boot_server().await;

    // u-b is valid but belongs to room 42 only, not room 7.
    let mut ws = connect(&server.chat_url("7", Some("tok-b"))).await;

    assert_eq!(read_close_code(&mut ws).await, Some(4001));
    assert_eq!(
        server.bus.member_count(&Group::chat(RoomId::new(7))).await,
        0
    );
}

/// Room id validation runs first: a malformed room id wins over a
/// missing token.
#[tokio::test]
async fn room_validation_runs_before_identity() {
    let server = boot_server().await;

    let mut ws = connect(&server.chat_url("abc", None)).await;

    assert_eq!(read_close_code(&mut ws).await, Some(4000));
}

/// A bearer token in the Authorization header admits the connection
/// when no query parameter is present.
#[tokio::test]
async fn authorization_header_admits_the_connection() {
    let server = boot_server().await;

    let mut request = server
        .chat_url("42", None)
        .into_client_request()
        .expect("invalid request");
    request
        .headers_mut()
        .insert("Authorization", HeaderValue::from_static("Bearer tok-a"));
    let (mut ws, _) = connect_async(request)
        .await
        .expect("websocket handshake failed");

    let joined = read_until(&mut ws, |frame| frame["type"] == "presence_join").await;
    assert_eq!(joined["user_id"], "u-a");
}

// ============================================================================
// Room Flow
// ============================================================================

/// Three members of one room all receive a broadcast, including the
/// sender, stamped with the sender's display identity and a string
/// room id.
#[tokio::test]
async fn broadcast_reaches_every_member_including_sender() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;
    let mut bob = join_room(&server, "42", "tok-b", "u-b").await;
    let mut carol = join_room(&server, "42", "tok-c", "u-c").await;

    send_json(&mut alice, json!({ "message": "hello" })).await;

    for ws in [&mut alice, &mut bob, &mut carol] {
        let frame = read_broadcast(ws).await;
        assert_eq!(frame["message"], "hello");
        assert_eq!(frame["sender"], "Test User u-a");
        assert_eq!(frame["user_id"], "u-a");
        assert_eq!(frame["room_id"], "42");
        assert!(frame["timestamp"].is_string());
    }
}

/// Oversized input is cut to 500 characters before it is broadcast or
/// archived.
#[tokio::test]
async fn long_message_is_truncated_to_500_characters() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;
    send_json(&mut alice, json!({ "message": "x".repeat(600) })).await;

    let frame = read_broadcast(&mut alice).await;
    let delivered = frame["message"].as_str().unwrap();
    assert_eq!(delivered.chars().count(), 500);
    assert_eq!(delivered, "x".repeat(500));

    let stored = server.archive.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content.chars().count(), 500);
}

/// Whitespace-only input draws an error reply to the sender alone; the
/// room sees nothing and nothing is archived.
#[tokio::test]
async fn empty_message_replies_to_sender_only() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;
    let mut bob = join_room(&server, "42", "tok-b", "u-b").await;

    send_json(&mut alice, json!({ "message": "   " })).await;

    let reply = read_until(&mut alice, |frame| frame.get("error").is_some()).await;
    assert_eq!(reply, json!({ "error": "Empty message" }));

    // Bob's next broadcast is the follow-up, proving the empty message
    // never reached the room.
    send_json(&mut alice, json!({ "message": "after" })).await;
    let next = read_broadcast(&mut bob).await;
    assert_eq!(next["message"], "after");

    let stored = server.archive.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "after");
}

/// Malformed JSON draws `Invalid JSON format` and leaves the connection
/// open for further traffic.
#[tokio::test]
async fn invalid_json_replies_and_keeps_the_connection() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;

    alice
        .send(Message::Text("{not json".to_string()))
        .await
        .unwrap();
    let reply = read_json(&mut alice).await;
    assert_eq!(reply, json!({ "error": "Invalid JSON format" }));

    send_json(&mut alice, json!({ "message": "still here" })).await;
    let frame = read_broadcast(&mut alice).await;
    assert_eq!(frame["message"], "still here");
}

/// Broadcasts from one sender arrive in the order they were sent.
#[tokio::test]
async fn broadcasts_preserve_sender_order() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;
    let mut bob = join_room(&server, "42", "tok-b", "u-b").await;

    for n in 1..=5 {
        send_json(&mut alice, json!({ "message": format!("m{n}") })).await;
    }

    for n in 1..=5 {
        let frame = read_broadcast(&mut bob).await;
        assert_eq!(frame["message"], format!("m{n}"));
    }
}

/// Typing indicators fan out to the room as tagged frames.
#[tokio::test]
async fn typing_indicators_fan_out() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;
    let mut bob = join_room(&server, "42", "tok-b", "u-b").await;

    send_json(&mut alice, json!({ "type": "typing_start" })).await;

    let frame = read_until(&mut bob, |frame| frame["type"] == "typing_start").await;
    assert_eq!(frame["user_id"], "u-a");
    assert_eq!(frame["display_name"], "Test User u-a");
}

/// Frames with an unrecognized type are dropped without an error reply.
#[tokio::test]
async fn unknown_frame_types_are_ignored() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;

    send_json(&mut alice, json!({ "type": "ping" })).await;
    assert!(try_read_json(&mut alice).await.is_none());
}

// ============================================================================
// Teardown
// ============================================================================

/// Closing the socket removes the member, and the room group itself once
/// it empties.
#[tokio::test]
async fn disconnect_tears_down_membership() {
    let server = boot_server().await;
    let room = Group::chat(RoomId::new(42));

    let alice = join_room(&server, "42", "tok-a", "u-a").await;
    let bob = join_room(&server, "42", "tok-b", "u-b").await;
    wait_for_members(&server, &room, 2).await;

    drop(alice);
    wait_for_members(&server, &room, 1).await;

    drop(bob);
    wait_for_members(&server, &room, 0).await;
    assert_eq!(server.bus.group_count().await, 0);
}

/// A member's departure is announced to the rest of the room.
#[tokio::test]
async fn departure_is_announced_to_the_room() {
    let server = boot_server().await;

    let mut alice = join_room(&server, "42", "tok-a", "u-a").await;
    let bob = join_room(&server, "42", "tok-b", "u-b").await;

    drop(bob);

    let frame = read_until(&mut alice, |frame| frame["type"] == "presence_leave").await;
    assert_eq!(frame["user_id"], "u-b");
}
