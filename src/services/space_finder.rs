//! Space lookups by ID and by path.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::{NormalizingCache, TtlCache};
use crate::domain::errors::DomainResult;
use crate::domain::models::{CacheConfig, SpaceCore};
use crate::domain::paths;
use crate::domain::ports::{loader_fn, Cache, SpaceStore};
use crate::services::evictor::Evictor;
use crate::services::finder::{Finder, FinderStats};

/// Resolves space references (`"42"` or `"acme/team1"`) to [`SpaceCore`]s.
///
/// Two caches: ID to core, and normalized path to ID. A changed space
/// drops its own entries only; descendants age out through the TTL.
pub struct SpaceFinder {
    finder: Finder<SpaceCore>,
    path_cache: Arc<NormalizingCache<i64>>,
}

impl SpaceFinder {
    pub fn new(store: Arc<dyn SpaceStore>, evictor: Arc<Evictor<SpaceCore>>, config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.space_ttl_secs);

        let id_store = Arc::clone(&store);
        let id_loader = loader_fn(move |id: i64| {
            let store = Arc::clone(&id_store);
            async move { store.find(id).await.map(|space| Arc::new(space.core())) }
        });
        let id_cache = Arc::new(TtlCache::with_capacity("space_id", id_loader, ttl, config.max_capacity));

        let path_loader = loader_fn(move |path: String| {
            let store = Arc::clone(&store);
            async move { store.find_id_by_path(&path).await }
        });
        let path_inner = Arc::new(TtlCache::with_capacity(
            "space_path",
            path_loader,
            ttl,
            config.max_capacity,
        ));
        let path_cache = Arc::new(NormalizingCache::with_transformation(
            path_inner,
            config.space_path_transformation,
        ));

        Self {
            finder: Finder::new(id_cache, evictor),
            path_cache,
        }
    }

    /// Register the eviction callbacks for space changes.
    pub async fn subscribe(&self) -> DomainResult<()> {
        let id_cache = Arc::clone(self.finder.id_cache());
        let path_cache = Arc::clone(&self.path_cache);
        self.finder
            .evictor()
            .subscribe(move |space: SpaceCore| {
                let id_cache = Arc::clone(&id_cache);
                let path_cache = Arc::clone(&path_cache);
                async move {
                    id_cache.evict(&space.id).await;
                    path_cache.evict(&space.path).await;
                    Ok(())
                }
            })
            .await?;

        let id_cache = Arc::clone(self.finder.id_cache());
        let path_cache = Arc::clone(&self.path_cache);
        self.finder
            .evictor()
            .subscribe_resync(move || {
                let id_cache = Arc::clone(&id_cache);
                let path_cache = Arc::clone(&path_cache);
                async move {
                    id_cache.evict_all().await;
                    path_cache.evict_all().await;
                }
            })
            .await
    }

    pub fn evictor(&self) -> &Arc<Evictor<SpaceCore>> {
        self.finder.evictor()
    }

    pub async fn find_by_id(&self, id: i64) -> DomainResult<Arc<SpaceCore>> {
        self.finder.find_by_id(id).await
    }

    /// Resolve a space ID or path.
    pub async fn find_by_ref(&self, space_ref: &str) -> DomainResult<Arc<SpaceCore>> {
        self.finder
            .find_by_ref(space_ref, |path| self.resolve_id(path))
            .await
    }

    async fn resolve_id(&self, path: String) -> DomainResult<i64> {
        paths::validate(&path)?;
        self.path_cache.get(&path).await
    }

    /// Announce a changed space. When the path changed, pass the core as it
    /// was before the change so the old path entry is dropped.
    pub async fn mark_changed(&self, space: &SpaceCore) {
        self.finder.mark_changed(space).await;
    }

    /// Drop all cached spaces in this process.
    pub async fn flush(&self) {
        self.finder.flush().await;
        self.path_cache.evict_all().await;
    }

    pub fn stats(&self) -> FinderStats {
        FinderStats {
            id: self.finder.id_stats(),
            reference: Some(self.path_cache.stats()),
        }
    }
}

impl std::fmt::Debug for SpaceFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceFinder").field("finder", &self.finder).finish_non_exhaustive()
    }
}
