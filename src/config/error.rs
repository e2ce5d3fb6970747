//! Failure modes of loading and validating configuration.

use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A loaded value that fails the semantic rules.
///
/// `MissingRequired` names the environment variable (without prefix)
/// that has to be set.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid panel base URL format")]
    InvalidPanelUrl,

    #[error("Panel base URL must use HTTPS in production")]
    PanelMustBeHttps,

    #[error("JWT secret must be at least 32 bytes")]
    WeakJwtSecret,

    #[error("Delivery queue capacity must be greater than zero")]
    InvalidQueueCapacity,
}
