//! Typed configuration, sourced from the environment.
//!
//! Settings come in through environment variables (plus a `.env` file in
//! development, via `dotenvy`) and deserialize into the section structs
//! below with the `config` crate. Variables carry the `ROOMCAST` prefix
//! and `__` between nesting levels, so `ROOMCAST__SERVER__PORT=9000`
//! lands in `server.port`.
//!
//! # Example
//!
//! ```no_run
//! use roomcast::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//!
//! println!("Listening on {}", config.server.bind_addr());
//! ```

mod auth;
mod error;
mod panel;
mod realtime;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use error::{ConfigError, ValidationError};
pub use panel::PanelConfig;
pub use realtime::{BusDriver, RealtimeConfig};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root of every setting the service reads.
///
/// All sections have working defaults for local development except the
/// secrets, which validation insists on; build one with
/// [`AppConfig::load()`].
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Realtime delivery configuration (bus driver, queue sizing)
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Redis configuration (pubsub broker)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Authentication configuration (panel-issued JWTs)
    #[serde(default)]
    pub auth: AuthConfig,

    /// Panel API configuration (room access, archival)
    #[serde(default)]
    pub panel: PanelConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment and validates it.
    ///
    /// A `.env` file is folded in first when one exists. Values that
    /// cannot be parsed into their section types surface as
    /// [`ConfigError::LoadError`]; values that parse but break a semantic
    /// rule surface as [`ConfigError::ValidationFailed`].
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: Self = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ROOMCAST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the semantic rules the type system cannot: URL shapes,
    /// secret strength, and production-only requirements such as HTTPS
    /// for the panel.
    ///
    /// The Redis section is only checked when the Redis bus driver is
    /// selected; with the in-memory driver it may be left unset.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.realtime.validate()?;
        if self.realtime.bus_driver == BusDriver::Redis {
            self.redis.validate()?;
        }
        self.auth.validate()?;
        self.panel.validate(&self.server.environment)?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
