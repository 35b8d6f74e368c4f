//! Upstream proxy configuration lookups, keyed by registry ID.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::TtlCache;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CacheConfig, UpstreamProxy};
use crate::domain::ports::{loader_fn, Cache, UpstreamProxyStore};
use crate::services::evictor::Evictor;
use crate::services::finder::{Finder, FinderStats};

pub struct UpstreamProxyFinder {
    finder: Finder<UpstreamProxy>,
}

impl UpstreamProxyFinder {
    pub fn new(
        store: Arc<dyn UpstreamProxyStore>,
        evictor: Arc<Evictor<UpstreamProxy>>,
        config: &CacheConfig,
    ) -> Self {
        let loader = loader_fn(move |registry_id: i64| {
            let store = Arc::clone(&store);
            async move { store.get_by_registry_id(registry_id).await.map(Arc::new) }
        });
        let cache = Arc::new(TtlCache::with_capacity(
            "upstream_proxy",
            loader,
            Duration::from_secs(config.registry_ttl_secs),
            config.max_capacity,
        ));

        Self {
            finder: Finder::new(cache, evictor),
        }
    }

    pub async fn subscribe(&self) -> DomainResult<()> {
        self.finder.subscribe_id_eviction().await
    }

    pub async fn find_by_registry_id(&self, registry_id: i64) -> DomainResult<Arc<UpstreamProxy>> {
        self.finder.find_by_id(registry_id).await
    }

    /// Proxies are addressed by their registry's ID only.
    pub async fn find_by_ref(&self, reference: &str) -> DomainResult<Arc<UpstreamProxy>> {
        self.finder
            .find_by_ref(reference, |reference| async move {
                Err(DomainError::invalid_reference(
                    reference,
                    "upstream proxies are referenced by registry ID",
                ))
            })
            .await
    }

    /// Drop the entry of one registry in this process.
    pub async fn evict(&self, registry_id: i64) {
        self.finder.id_cache().evict(&registry_id).await;
    }

    pub async fn mark_changed(&self, proxy: &UpstreamProxy) {
        self.finder.mark_changed(proxy).await;
    }

    pub async fn flush(&self) {
        self.finder.flush().await;
    }

    pub fn stats(&self) -> FinderStats {
        FinderStats {
            id: self.finder.id_stats(),
            reference: None,
        }
    }
}

impl std::fmt::Debug for UpstreamProxyFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamProxyFinder")
            .field("finder", &self.finder)
            .finish()
    }
}
