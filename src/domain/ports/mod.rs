//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async interfaces the reference cache is built on:
//! - Cache / Loader: TTL cache with load-on-miss
//! - PubSub: message bus carrying invalidation broadcasts
//! - SpaceStore, RepoStore, RegistryStore, UpstreamProxyStore: the
//!   relational store that owns the rows being cached
//!
//! Adapters in `crate::adapters` implement these traits.

pub mod cache;
pub mod pubsub;
pub mod registry_store;
pub mod repo_store;
pub mod space_store;
pub mod upstream_proxy_store;

pub use cache::{loader_fn, Cache, CacheStats, Loader, LoaderFn};
pub use pubsub::{LagHandler, MessageHandler, PubSub, Subscription};
pub use registry_store::RegistryStore;
pub use repo_store::RepoStore;
pub use space_store::SpaceStore;
pub use upstream_proxy_store::UpstreamProxyStore;
