//! Roomcast service entrypoint.
//!
//! Loads configuration, wires the adapters behind their ports, and
//! serves the realtime endpoints until a shutdown signal arrives.

use std::sync::Arc;

use axum::{routing::get, Router};
use secrecy::ExposeSecret;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomcast::adapters::auth::{JwtConfig, JwtSessionValidator};
use roomcast::adapters::bus::{InMemoryMessageBus, RedisMessageBus};
use roomcast::adapters::panel::{PanelClientConfig, PanelMessageArchive, PanelRoomAccess};
use roomcast::adapters::websocket::{realtime_router, RealtimeState};
use roomcast::config::{AppConfig, BusDriver};
use roomcast::ports::MessageBus;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    init_tracing(&config);

    let bus = build_bus(&config).await?;

    let jwt = JwtConfig::new(
        config.auth.jwt_secret.expose_secret().as_str(),
        &config.auth.jwt_issuer,
    );
    let sessions = Arc::new(JwtSessionValidator::new(jwt));

    let panel = PanelClientConfig::new(
        &config.panel.base_url,
        config.panel.service_token.expose_secret().as_str(),
    )
    .with_timeout(config.panel.timeout());
    let access = Arc::new(PanelRoomAccess::new(panel.clone()));
    let archive = Arc::new(PanelMessageArchive::new(panel));

    let state = RealtimeState::new(bus, sessions, access, archive)
        .with_delivery_queue_capacity(config.realtime.delivery_queue_capacity);

    let app = Router::new()
        .nest("/ws", realtime_router())
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Roomcast listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the configured filter; production gets JSON
/// lines, everything else human-readable output.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Builds the message bus named by the configuration.
async fn build_bus(config: &AppConfig) -> Result<Arc<dyn MessageBus>, Box<dyn std::error::Error>> {
    match config.realtime.bus_driver {
        BusDriver::Memory => {
            tracing::info!("Using in-memory message bus");
            Ok(Arc::new(InMemoryMessageBus::new()))
        }
        BusDriver::Redis => {
            tracing::info!("Connecting to Redis message bus");
            let bus = RedisMessageBus::connect(&config.redis.url).await?;
            Ok(Arc::new(bus))
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Resolves when the process receives SIGTERM or ctrl-c.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
