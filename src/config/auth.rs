//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Minimum JWT secret length in bytes.
const MIN_SECRET_BYTES: usize = 32;

/// Authentication configuration (panel-issued JWTs)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret for token verification
    #[serde(default = "empty_secret")]
    pub jwt_secret: SecretString,

    /// Expected `iss` claim
    #[serde(default)]
    pub jwt_issuer: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_JWT_SECRET"));
        }
        if self.jwt_secret.expose_secret().len() < MIN_SECRET_BYTES {
            return Err(ValidationError::WeakJwtSecret);
        }
        if self.jwt_issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_JWT_ISSUER"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: empty_secret(),
            jwt_issuer: String::new(),
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}
