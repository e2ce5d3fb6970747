//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `realtime` - Delivery groups, realtime events, and frame-handling rules

pub mod foundation;
pub mod realtime;
