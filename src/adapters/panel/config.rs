//! Configuration for the panel HTTP client adapters.

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};

use crate::domain::foundation::RoomId;

/// Configuration shared by the panel-backed adapters.
///
/// The panel exposes an internal API for the two questions this service
/// asks it: may a user join a room, and store this message. Both
/// adapters authenticate with the same service token.
#[derive(Clone)]
pub struct PanelClientConfig {
    /// Base URL of the panel service (e.g., "http://panel:8000").
    pub base_url: String,

    /// Bearer token identifying this service to the panel.
    service_token: Secret<String>,

    /// Request timeout.
    pub timeout: Duration,
}

impl PanelClientConfig {
    /// Creates a new configuration with the given base URL and token.
    pub fn new(base_url: impl Into<String>, service_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_token: Secret::new(service_token.into()),
            timeout: Duration::from_secs(5),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the service token (for request headers).
    pub(super) fn service_token(&self) -> &str {
        self.service_token.expose_secret()
    }

    /// URL of the access predicate for one user and room.
    pub(super) fn access_url(&self, room: RoomId, user_id: &str) -> String {
        format!(
            "{}/api/rooms/{}/access/{}",
            self.base_url.trim_end_matches('/'),
            room,
            user_id
        )
    }

    /// URL of the message collection for one room.
    pub(super) fn messages_url(&self, room: RoomId) -> String {
        format!(
            "{}/api/rooms/{}/messages",
            self.base_url.trim_end_matches('/'),
            room
        )
    }
}

impl std::fmt::Debug for PanelClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builds_access_url() {
        let config = PanelClientConfig::new("http://panel:8000", "token");
        assert_eq!(
            config.access_url(RoomId::new(42), "7"),
            "http://panel:8000/api/rooms/42/access/7"
        );
    }

    #[test]
    fn config_builds_messages_url() {
        let config = PanelClientConfig::new("http://panel:8000", "token");
        assert_eq!(
            config.messages_url(RoomId::new(42)),
            "http://panel:8000/api/rooms/42/messages"
        );
    }

    #[test]
    fn config_handles_trailing_slash() {
        let config = PanelClientConfig::new("http://panel:8000/", "token");
        assert_eq!(
            config.messages_url(RoomId::new(1)),
            "http://panel:8000/api/rooms/1/messages"
        );
    }

    #[test]
    fn config_with_custom_timeout() {
        let config =
            PanelClientConfig::new("http://panel:8000", "token").with_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn config_debug_hides_token() {
        let config = PanelClientConfig::new("http://panel:8000", "very-secret-token");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret-token"));
    }
}
