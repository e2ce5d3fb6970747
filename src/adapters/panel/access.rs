//! Panel-backed room access adapter.
//!
//! Implements the `RoomAccess` port by asking the panel's internal API
//! whether a user belongs to a room. The panel answers `200` with
//! `{"allowed": bool}` for a known room and `404` for a room that does
//! not exist; a missing room is a plain denial here, not an error.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::foundation::{RoomId, UserId};
use crate::ports::{AccessError, RoomAccess};

use super::config::PanelClientConfig;

/// Response body of the panel's access predicate.
#[derive(Debug, Deserialize)]
struct AccessReply {
    allowed: bool,
}

/// RoomAccess implementation backed by the panel service.
pub struct PanelRoomAccess {
    config: PanelClientConfig,
    client: Client,
}

impl PanelRoomAccess {
    /// Creates a new adapter with the given configuration.
    pub fn new(config: PanelClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[async_trait]
impl RoomAccess for PanelRoomAccess {
    async fn can_access(&self, user: &UserId, room: RoomId) -> Result<bool, AccessError> {
        let url = self.config.access_url(room, user.as_str());

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.service_token())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(room = %room, error = %e, "Access check request failed");
                AccessError::Unavailable(e.to_string())
            })?;

        match response.status() {
            StatusCode::OK => {
                let reply: AccessReply = response.json().await.map_err(|e| {
                    AccessError::InvalidResponse(format!("Unparseable access reply: {}", e))
                })?;
                Ok(reply.allowed)
            }
            // The room does not exist, so there is nothing to access.
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(AccessError::InvalidResponse(format!(
                "Access endpoint returned {}",
                status
            ))),
        }
    }
}

impl std::fmt::Debug for PanelRoomAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelRoomAccess")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
