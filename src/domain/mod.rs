//! Domain layer for the reference-resolution cache
//!
//! Entities, cache keys, path rules, errors and the ports the cache
//! layer depends on. Nothing here knows about SQLite, NATS or moka.

pub mod errors;
pub mod models;
pub mod paths;
pub mod ports;

pub use errors::{DomainError, DomainResult, ErrorKind, ResultExt};
