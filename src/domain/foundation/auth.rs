//! Authentication types for the domain layer.
//!
//! These types represent an authenticated user extracted from a bearer
//! token. They have **no external dependencies** - any identity source
//! (panel-issued JWTs, a test fixture) can populate them via the
//! `SessionValidator` port.
//!
//! # Design Decisions
//!
//! - `AuthenticatedUser` contains only the claims the realtime layer uses
//! - `AuthError` is domain-centric, not provider-specific
//! - Types are `Clone` for easy capture in per-connection tasks

use super::UserId;
use thiserror::Error;

/// Authenticated user extracted from a validated token.
///
/// The realtime layer cares about two things: a stable id for origin
/// comparison, and a name to show next to messages.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// Login name from the token claims.
    pub username: String,

    /// Full display name if the account has one set.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    ///
    /// This is typically called by the `SessionValidator` adapter after
    /// successfully validating a token.
    pub fn new(id: UserId, username: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name,
        }
    }

    /// Returns the user's display name, or username as fallback.
    pub fn display_identity(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Authentication errors that can occur during token validation.
///
/// These errors are **domain-centric** - they describe what went wrong
/// from the application's perspective, not the auth provider's.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but the user no longer exists in the system.
    #[error("User not found")]
    UserNotFound,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}
