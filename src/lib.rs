//! refcache - distributed reference-resolution cache
//!
//! Resolves human-readable references (`acme/team1/app`) and numeric IDs of
//! spaces, repositories, registries and upstream proxies through TTL
//! caches with single-flight loading. Changes are broadcast over a message
//! bus so every process drops its stale entries.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, path rules, errors and port traits
//! - **Service Layer** (`services`): evictors and the per-entity finders
//! - **Adapters** (`adapters`): moka caches, message buses, SQLite stores
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use refcache::adapters::pubsub::InMemoryPubSub;
//! use refcache::services::RefCacheService;
//!
//! let service = RefCacheService::new(&config, stores, Arc::new(InMemoryPubSub::new(1024))).await?;
//! let repo = service.repos.find_by_ref("acme/team1/app").await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult, ErrorKind};
pub use domain::models::{
    CacheConfig, Config, PubSubConfig, Registry, RepositoryCore, SpaceCore, UpstreamProxy,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{RefCacheService, ServiceStats, Stores};
