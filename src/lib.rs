//! Roomcast - Real-time chat room and notification fan-out service
//!
//! This crate implements the realtime half of a chat product: WebSocket
//! endpoints for per-room conversation and per-user notification pushes,
//! fanned out over a pluggable message bus.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
