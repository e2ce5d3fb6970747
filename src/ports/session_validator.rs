//! Session validation port for bearer token validation.
//!
//! This port defines the contract for validating access tokens and
//! extracting user identity. It is provider-agnostic - the production
//! implementation validates panel-issued JWTs, and a mock exists for
//! tests and local development.
//!
//! A connection with no token, or whose token fails validation, is
//! anonymous; the handshake turns that into a permission failure.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Validate issuer and expiry claims
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate an access token and return the authenticated user.
    ///
    /// # Arguments
    ///
    /// * `token` - The raw token (without "Bearer " prefix)
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
