//! Registry lookups by ID, by `<root space>/<name>`, and by root space ID
//! plus name.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::TtlCache;
use crate::domain::errors::{DomainError, DomainResult, ResultExt};
use crate::domain::models::{CacheConfig, Registry, RegistryRootRefCacheKey};
use crate::domain::paths;
use crate::domain::ports::{loader_fn, Cache, RegistryStore};
use crate::services::evictor::Evictor;
use crate::services::finder::{Finder, FinderStats};
use crate::services::space_finder::SpaceFinder;
use crate::services::upstream_proxy_finder::UpstreamProxyFinder;

/// Resolves registry references to [`Registry`] values.
///
/// A changed registry also drops the cached upstream proxy configuration
/// of the same registry.
pub struct RegistryFinder {
    finder: Finder<Registry>,
    ref_cache: Arc<dyn Cache<RegistryRootRefCacheKey, i64>>,
    spaces: Arc<SpaceFinder>,
    upstream_proxies: Arc<UpstreamProxyFinder>,
}

impl RegistryFinder {
    pub fn new(
        store: Arc<dyn RegistryStore>,
        spaces: Arc<SpaceFinder>,
        upstream_proxies: Arc<UpstreamProxyFinder>,
        evictor: Arc<Evictor<Registry>>,
        config: &CacheConfig,
    ) -> Self {
        let ttl = Duration::from_secs(config.registry_ttl_secs);

        let id_store = Arc::clone(&store);
        let id_loader = loader_fn(move |id: i64| {
            let store = Arc::clone(&id_store);
            async move { store.get(id).await.map(Arc::new) }
        });
        let id_cache = Arc::new(TtlCache::with_capacity("registry_id", id_loader, ttl, config.max_capacity));

        let ref_loader = loader_fn(move |key: RegistryRootRefCacheKey| {
            let store = Arc::clone(&store);
            async move {
                store
                    .get_id_by_root_parent_id_and_name(key.root_parent_id, &key.identifier)
                    .await
            }
        });
        let ref_cache = Arc::new(TtlCache::with_capacity(
            "registry_ref",
            ref_loader,
            ttl,
            config.max_capacity,
        ));

        Self {
            finder: Finder::new(id_cache, evictor),
            ref_cache,
            spaces,
            upstream_proxies,
        }
    }

    pub async fn subscribe(&self) -> DomainResult<()> {
        let id_cache = Arc::clone(self.finder.id_cache());
        let ref_cache = Arc::clone(&self.ref_cache);
        let upstream_proxies = Arc::clone(&self.upstream_proxies);
        self.finder
            .evictor()
            .subscribe(move |registry: Registry| {
                let id_cache = Arc::clone(&id_cache);
                let ref_cache = Arc::clone(&ref_cache);
                let upstream_proxies = Arc::clone(&upstream_proxies);
                async move {
                    id_cache.evict(&registry.id).await;
                    ref_cache
                        .evict(&RegistryRootRefCacheKey::new(registry.root_parent_id, &registry.name))
                        .await;
                    upstream_proxies.evict(registry.id).await;
                    Ok(())
                }
            })
            .await?;

        let id_cache = Arc::clone(self.finder.id_cache());
        let ref_cache = Arc::clone(&self.ref_cache);
        let upstream_proxies = Arc::clone(&self.upstream_proxies);
        self.finder
            .evictor()
            .subscribe_resync(move || {
                let id_cache = Arc::clone(&id_cache);
                let ref_cache = Arc::clone(&ref_cache);
                let upstream_proxies = Arc::clone(&upstream_proxies);
                async move {
                    id_cache.evict_all().await;
                    ref_cache.evict_all().await;
                    upstream_proxies.flush().await;
                }
            })
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> DomainResult<Arc<Registry>> {
        self.finder.find_by_id(id).await
    }

    /// Resolve a registry ID or `<root space>/<name>` reference.
    pub async fn find_by_ref(&self, registry_ref: &str) -> DomainResult<Arc<Registry>> {
        self.finder
            .find_by_ref(registry_ref, |reference| self.resolve_id(reference))
            .await
    }

    async fn resolve_id(&self, reference: String) -> DomainResult<i64> {
        let (root, rest) = paths::dissect_root(&reference)?;
        let name = match rest {
            Some(name) if paths::is_root(&name) => name,
            _ => {
                return Err(DomainError::invalid_reference(
                    reference,
                    "registry reference must be '<root space>/<name>'",
                ))
            }
        };
        let root = self.root_space_id(&root).await?;
        self.ref_cache.get(&RegistryRootRefCacheKey::new(root, &name)).await
    }

    /// Resolve a registry by the ID of its root space and its name.
    pub async fn find_by_root_parent_id(&self, root_parent_id: i64, identifier: &str) -> DomainResult<Arc<Registry>> {
        let id = self
            .ref_cache
            .get(&RegistryRootRefCacheKey::new(root_parent_id, identifier))
            .await
            .with_context(|| format!("resolve registry '{identifier}' under space {root_parent_id}"))?;
        self.find_by_id(id).await
    }

    /// Resolve a registry by the reference of its root space and its name.
    /// The space must be a root space.
    pub async fn find_by_root_ref(&self, root_ref: &str, identifier: &str) -> DomainResult<Arc<Registry>> {
        let root = self.root_space_id(root_ref).await?;
        self.find_by_root_parent_id(root, identifier).await
    }

    async fn root_space_id(&self, root_ref: &str) -> DomainResult<i64> {
        let space = self.spaces.find_by_ref(root_ref).await?;
        if !space.is_root() {
            return Err(DomainError::invalid_reference(
                root_ref,
                format!("space '{}' is not a root space", space.path),
            ));
        }
        Ok(space.id)
    }

    pub async fn mark_changed(&self, registry: &Registry) {
        self.finder.mark_changed(registry).await;
    }

    pub async fn flush(&self) {
        self.finder.flush().await;
        self.ref_cache.evict_all().await;
    }

    pub fn stats(&self) -> FinderStats {
        FinderStats {
            id: self.finder.id_stats(),
            reference: Some(self.ref_cache.stats()),
        }
    }
}

impl std::fmt::Debug for RegistryFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryFinder").field("finder", &self.finder).finish_non_exhaustive()
    }
}
