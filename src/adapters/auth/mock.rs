//! In-memory stand-in for panel session validation.
//!
//! Tests build a fixed token table up front; there is no runtime
//! mutation, which keeps the mock free of locks.
//!
//! # Example
//!
//! ```
//! use roomcast::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new()
//!     .with_test_user("valid-token", "user-123");
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Session validator backed by a fixed token table.
///
/// Unknown tokens come back as `InvalidToken`; a forced error, when
/// set, beats every lookup so outage handling can be exercised.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: HashMap<String, AuthenticatedUser>,
    outage: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as resolving to `user`.
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    /// Registers `token` as resolving to a generated user whose display
    /// name is `Test User {user_id}`.
    pub fn with_test_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let user = AuthenticatedUser::new(
            UserId::new(&user_id).unwrap(),
            user_id.clone(),
            Some(format!("Test User {}", user_id)),
        );
        self.with_user(token, user)
    }

    /// Makes every validation fail with `error`, valid tokens included.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.outage = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
