//! Realtime delivery configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which message bus implementation carries group traffic.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusDriver {
    /// Single-process fan-out; suitable for development and tests.
    #[default]
    Memory,
    /// Redis pub/sub; required when more than one instance runs.
    Redis,
}

/// Realtime delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Bus driver selection
    #[serde(default)]
    pub bus_driver: BusDriver,

    /// Per-connection delivery queue capacity
    #[serde(default = "default_delivery_queue_capacity")]
    pub delivery_queue_capacity: usize,
}

impl RealtimeConfig {
    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.delivery_queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            bus_driver: BusDriver::default(),
            delivery_queue_capacity: default_delivery_queue_capacity(),
        }
    }
}

fn default_delivery_queue_capacity() -> usize {
    256
}
