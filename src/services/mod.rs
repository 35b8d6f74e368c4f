//! Reference finders and the eviction plumbing that keeps them coherent
//! across processes.

pub mod evictor;
pub mod finder;
pub mod refcache_service;
pub mod registry_finder;
pub mod repo_finder;
pub mod space_finder;
pub mod upstream_proxy_finder;

#[cfg(test)]
pub(crate) mod test_support;

pub use evictor::{topic_name, EvictCallback, EvictionMessage, Evictor, ResyncCallback};
pub use finder::{Finder, FinderStats};
pub use refcache_service::{RefCacheService, ServiceStats, Stores};
pub use registry_finder::RegistryFinder;
pub use repo_finder::RepoFinder;
pub use space_finder::SpaceFinder;
pub use upstream_proxy_finder::UpstreamProxyFinder;
