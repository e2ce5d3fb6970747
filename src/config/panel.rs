//! Panel API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Panel API configuration (room access checks, message archival)
#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    /// Base URL of the panel service
    #[serde(default)]
    pub base_url: String,

    /// Service token for panel API calls
    #[serde(default = "empty_token")]
    pub service_token: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PanelConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate panel configuration
    ///
    /// In production, requires HTTPS for the base URL.
    /// In development, allows localhost with HTTP/HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("PANEL_BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidPanelUrl);
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::PanelMustBeHttps);
        }
        if self.service_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PANEL_SERVICE_TOKEN"));
        }
        Ok(())
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_token: empty_token(),
            timeout_secs: default_timeout(),
        }
    }
}

fn empty_token() -> SecretString {
    SecretString::new(String::new())
}

fn default_timeout() -> u64 {
    5
}
