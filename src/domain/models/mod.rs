//! Domain models: the entities resolved by the finders, their cacheable
//! core projections, and the composite keys of the reference caches.

pub mod config;
pub mod keys;
pub mod registry;
pub mod repository;
pub mod space;
pub mod upstream_proxy;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use config::{CacheConfig, Config, DatabaseConfig, LoggingConfig, PubSubConfig, PubSubProvider};
pub use keys::{RegistryRootRefCacheKey, RepoCacheKey};
pub use registry::{PackageType, Registry, RegistryType};
pub use repository::{Repository, RepositoryCore, RepositoryState};
pub use space::{Space, SpaceCore};
pub use upstream_proxy::{UpstreamAuthType, UpstreamProxy, UpstreamSource};

/// An immutable snapshot that can be cached by ID and broadcast on change.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Short entity name, used in topics, log fields and errors.
    const KIND: &'static str;

    /// Key under which the snapshot is stored in the ID-cache.
    fn cache_id(&self) -> i64;
}
