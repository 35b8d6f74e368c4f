//! Wires the finders, their evictors and the stores into one service.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, Entity, Registry, RepositoryCore, SpaceCore, UpstreamProxy};
use crate::domain::ports::{PubSub, RegistryStore, RepoStore, SpaceStore, UpstreamProxyStore};
use crate::services::evictor::Evictor;
use crate::services::finder::FinderStats;
use crate::services::registry_finder::RegistryFinder;
use crate::services::repo_finder::RepoFinder;
use crate::services::space_finder::SpaceFinder;
use crate::services::upstream_proxy_finder::UpstreamProxyFinder;

/// Backing stores consulted on cache misses.
#[derive(Clone)]
pub struct Stores {
    pub spaces: Arc<dyn SpaceStore>,
    pub repos: Arc<dyn RepoStore>,
    pub registries: Arc<dyn RegistryStore>,
    pub upstream_proxies: Arc<dyn UpstreamProxyStore>,
}

/// Hit/miss counters of every finder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ServiceStats {
    pub spaces: FinderStats,
    pub repos: FinderStats,
    pub registries: FinderStats,
    pub upstream_proxies: FinderStats,
}

/// Every finder of one process, subscribed to its invalidation topics.
#[derive(Debug)]
pub struct RefCacheService {
    pub spaces: Arc<SpaceFinder>,
    pub repos: Arc<RepoFinder>,
    pub registries: Arc<RegistryFinder>,
    pub upstream_proxies: Arc<UpstreamProxyFinder>,
}

impl RefCacheService {
    /// Build the finders and register their eviction callbacks on `pubsub`.
    pub async fn new(config: &Config, stores: Stores, pubsub: Arc<dyn PubSub>) -> DomainResult<Self> {
        let namespace = config.pubsub.namespace.as_str();
        let cache = &config.cache;

        let spaces = Arc::new(SpaceFinder::new(
            stores.spaces,
            Arc::new(Evictor::new(Arc::clone(&pubsub), namespace, SpaceCore::KIND)),
            cache,
        ));
        let repos = Arc::new(RepoFinder::new(
            stores.repos,
            Arc::clone(&spaces),
            Arc::new(Evictor::new(Arc::clone(&pubsub), namespace, RepositoryCore::KIND)),
            cache,
        ));
        let upstream_proxies = Arc::new(UpstreamProxyFinder::new(
            stores.upstream_proxies,
            Arc::new(Evictor::new(Arc::clone(&pubsub), namespace, UpstreamProxy::KIND)),
            cache,
        ));
        let registries = Arc::new(RegistryFinder::new(
            stores.registries,
            Arc::clone(&spaces),
            Arc::clone(&upstream_proxies),
            Arc::new(Evictor::new(pubsub, namespace, Registry::KIND)),
            cache,
        ));

        spaces.subscribe().await?;
        repos.subscribe().await?;
        upstream_proxies.subscribe().await?;
        registries.subscribe().await?;

        tracing::info!(namespace, "reference caches ready");

        Ok(Self {
            spaces,
            repos,
            registries,
            upstream_proxies,
        })
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            spaces: self.spaces.stats(),
            repos: self.repos.stats(),
            registries: self.registries.stats(),
            upstream_proxies: self.upstream_proxies.stats(),
        }
    }

    /// Drop every cache of this process.
    pub async fn flush(&self) {
        self.spaces.flush().await;
        self.repos.flush().await;
        self.registries.flush().await;
        self.upstream_proxies.flush().await;
    }
}
