//! Message bus implementations.
//!
//! Two drivers share the same local fan-out machinery (the group
//! registry): [`InMemoryMessageBus`] for single-process deployments and
//! tests, and [`RedisMessageBus`] for multi-process deployments where
//! events must cross process boundaries through the broker.

mod in_memory;
mod redis;
mod registry;

pub use in_memory::InMemoryMessageBus;
pub use redis::RedisMessageBus;
