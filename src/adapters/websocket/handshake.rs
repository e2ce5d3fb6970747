//! Connection handshake: identity resolution and room admission.
//!
//! Checks run in a fixed order - room id format, then identity, then
//! room access - and the first failure wins. Subscribing the connection
//! to its group happens after every check has passed, never before, so
//! a refused connection leaves no membership behind.

use std::collections::HashMap;

use axum::http::HeaderMap;

use crate::domain::foundation::{AuthError, AuthenticatedUser, RoomId};
use crate::domain::realtime::HandshakeError;

use super::state::RealtimeState;

/// Pulls the bearer token out of an upgrade request.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token
/// normally travels as the `token` query parameter; the Authorization
/// header is honored for non-browser clients.
pub(super) fn bearer_token(
    params: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Option<String> {
    if let Some(token) = params.get("token") {
        if !token.is_empty() {
            return Some(token.clone());
        }
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Resolves the connection's identity, or nothing for anonymous.
///
/// Invalid, expired, and unknown-user tokens all read as anonymous; a
/// validator outage is surfaced as its own failure because the answer
/// is unknown rather than "no".
pub(super) async fn resolve_identity(
    state: &RealtimeState,
    token: Option<&str>,
) -> Result<Option<AuthenticatedUser>, HandshakeError> {
    let Some(token) = token else {
        return Ok(None);
    };

    match state.sessions.validate(token).await {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::InvalidToken | AuthError::TokenExpired | AuthError::UserNotFound) => {
            Ok(None)
        }
        Err(error @ AuthError::ServiceUnavailable(_)) => Err(HandshakeError::unexpected(error)),
    }
}

/// Runs the chat admission checks in order.
///
/// Returns the admitted identity and room; the caller subscribes and
/// flips the connection to open only after this returns `Ok`.
pub(super) async fn admit_to_room(
    state: &RealtimeState,
    raw_room: &str,
    token: Option<&str>,
) -> Result<(AuthenticatedUser, RoomId), HandshakeError> {
    let room: RoomId = raw_room.parse()?;

    let Some(user) = resolve_identity(state, token).await? else {
        tracing::warn!(room = %room, "Rejected anonymous chat connection");
        return Err(HandshakeError::Anonymous);
    };

    let allowed = state
        .access
        .can_access(&user.id, room)
        .await
        .map_err(HandshakeError::unexpected)?;
    if !allowed {
        tracing::warn!(user_id = %user.id, room = %room, "Rejected chat connection: no room access");
        return Err(HandshakeError::AccessDenied);
    }

    Ok((user, room))
}
