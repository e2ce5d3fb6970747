//! Adapters - implementations of the port interfaces.
//!
//! Adapters connect the realtime core to external systems:
//! - `auth` - token validation (panel-issued JWTs, mock)
//! - `bus` - message bus implementations (in-memory, Redis)
//! - `panel` - room access and message archival over the panel HTTP API
//! - `websocket` - the client-facing realtime endpoints

pub mod auth;
pub mod bus;
pub mod panel;
pub mod websocket;
