//! JWT adapter for session validation.
//!
//! This adapter implements the `SessionValidator` port for tokens minted
//! by the panel service. The panel signs a short-lived HS256 token with a
//! shared secret when it hands a user the chat page; this adapter
//! validates tokens by:
//!
//! 1. Verifying the signature against the shared secret
//! 2. Validating issuer and expiry claims
//! 3. Mapping claims to the domain `AuthenticatedUser` type
//!
//! # Example
//!
//! ```ignore
//! use roomcast::adapters::auth::{JwtConfig, JwtSessionValidator};
//! use roomcast::ports::SessionValidator;
//!
//! let config = JwtConfig::new("shared-secret", "panel");
//! let validator = JwtSessionValidator::new(config);
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for the JWT session validator.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared signing secret. Must match the panel's signing key.
    pub secret: SecretString,

    /// Expected issuer claim. Tokens from any other issuer are rejected.
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new configuration with required fields.
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            issuer: issuer.into(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Claims the panel puts in a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Subject - the panel user id
    sub: String,

    /// Issuer
    iss: String,

    /// Expiry timestamp (Unix epoch seconds)
    exp: i64,

    /// Login name
    #[serde(default)]
    username: Option<String>,

    /// Full display name, if the account has one
    #[serde(default)]
    name: Option<String>,
}

/// HS256 session validator for panel-issued tokens.
///
/// This is the production implementation of `SessionValidator`.
pub struct JwtSessionValidator {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtSessionValidator {
    /// Create a new validator from the shared secret.
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    /// Validate a token and extract its claims.
    fn decode_claims(&self, token: &str) -> Result<TokenData<SessionClaims>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("Invalid issuer in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token_data = self.decode_claims(token)?;
        let claims = token_data.claims;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Empty subject in token");
            AuthError::InvalidToken
        })?;

        // The panel always sets username; fall back to the subject so a
        // sparse token still yields a usable identity.
        let username = claims.username.unwrap_or_else(|| claims.sub.clone());

        Ok(AuthenticatedUser::new(user_id, username, claims.name))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}
