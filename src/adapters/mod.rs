//! Infrastructure adapters for external systems.
//!
//! - `cache`: moka-backed TTL caches implementing the `Cache` port
//! - `pubsub`: in-memory and NATS message buses implementing `PubSub`
//! - `sqlite`: sqlx-backed reference stores

pub mod cache;
pub mod pubsub;
pub mod sqlite;
