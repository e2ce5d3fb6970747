//! Panel-backed message archive adapter.
//!
//! Implements the `MessageArchive` port by posting each sanitized chat
//! message to the panel's message collection. The caller treats every
//! failure as non-fatal, so this adapter only has to classify them:
//! client errors mean the panel refused the record, everything else
//! means it could not take it right now.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::foundation::{RoomId, UserId};
use crate::ports::{ArchiveError, MessageArchive};

use super::config::PanelClientConfig;

/// Request body for the panel's message collection.
#[derive(Debug, Serialize)]
struct StoreMessageRequest<'a> {
    user_id: &'a str,
    content: &'a str,
}

/// MessageArchive implementation backed by the panel service.
pub struct PanelMessageArchive {
    config: PanelClientConfig,
    client: Client,
}

impl PanelMessageArchive {
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
impl MessageArchive for PanelMessageArchive {
    async fn store(
        &self,
        room: RoomId,
        sender: &UserId,
        content: &str,
    ) -> Result<(), ArchiveError> {
        let url = self.config.messages_url(room);
        let body = StoreMessageRequest {
            user_id: sender.as_str(),
            content,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.service_token())
            .json(&body)
            .send()
            .await
            .map_err(|e| ArchiveError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_client_error() {
            Err(ArchiveError::Rejected(format!(
                "Panel returned {}",
                status
            )))
        } else {
            Err(ArchiveError::Unavailable(format!(
                "Panel returned {}",
                status
            )))
        }
    }
}

impl std::fmt::Debug for PanelMessageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelMessageArchive")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
