//! Repository lookups by ID and by `<space path>/<identifier>`.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::cache::TtlCache;
use crate::domain::errors::{DomainResult, ResultExt};
use crate::domain::models::{CacheConfig, RepoCacheKey, Repository, RepositoryCore, SpaceCore};
use crate::domain::paths;
use crate::domain::ports::{loader_fn, Cache, RepoStore};
use crate::services::evictor::Evictor;
use crate::services::finder::{Finder, FinderStats};
use crate::services::space_finder::SpaceFinder;

/// Resolves repository references to [`RepositoryCore`]s.
///
/// A repository's path embeds its ancestors' paths, so any space change
/// clears the whole repository ID-cache. The ref-cache is keyed by space ID
/// and survives space renames.
pub struct RepoFinder {
    finder: Finder<RepositoryCore>,
    ref_cache: Arc<dyn Cache<RepoCacheKey, i64>>,
    spaces: Arc<SpaceFinder>,
    store: Arc<dyn RepoStore>,
}

impl RepoFinder {
    pub fn new(
        store: Arc<dyn RepoStore>,
        spaces: Arc<SpaceFinder>,
        evictor: Arc<Evictor<RepositoryCore>>,
        config: &CacheConfig,
    ) -> Self {
        let ttl = Duration::from_secs(config.repo_ttl_secs);

        let id_store = Arc::clone(&store);
        let id_loader = loader_fn(move |id: i64| {
            let store = Arc::clone(&id_store);
            async move { store.find(id).await.map(|repo| Arc::new(repo.core())) }
        });
        let id_cache = Arc::new(TtlCache::with_capacity("repo_id", id_loader, ttl, config.max_capacity));

        let ref_store = Arc::clone(&store);
        let ref_loader = loader_fn(move |key: RepoCacheKey| {
            let store = Arc::clone(&ref_store);
            async move { store.find_id_by_identifier(key.space_id, &key.identifier).await }
        });
        let ref_cache = Arc::new(TtlCache::with_capacity("repo_ref", ref_loader, ttl, config.max_capacity));

        Self {
            finder: Finder::new(id_cache, evictor),
            ref_cache,
            spaces,
            store,
        }
    }

    /// Register the eviction callbacks: a changed repository drops its ID and
    /// ref entries, a changed space drops every cached repository.
    pub async fn subscribe(&self) -> DomainResult<()> {
        let id_cache = Arc::clone(self.finder.id_cache());
        let ref_cache = Arc::clone(&self.ref_cache);
        self.finder
            .evictor()
            .subscribe(move |repo: RepositoryCore| {
                let id_cache = Arc::clone(&id_cache);
                let ref_cache = Arc::clone(&ref_cache);
                async move {
                    id_cache.evict(&repo.id).await;
                    ref_cache.evict(&RepoCacheKey::new(repo.parent_id, &repo.identifier)).await;
                    Ok(())
                }
            })
            .await?;

        let id_cache = Arc::clone(self.finder.id_cache());
        let ref_cache = Arc::clone(&self.ref_cache);
        self.finder
            .evictor()
            .subscribe_resync(move || {
                let id_cache = Arc::clone(&id_cache);
                let ref_cache = Arc::clone(&ref_cache);
                async move {
                    id_cache.evict_all().await;
                    ref_cache.evict_all().await;
                }
            })
            .await?;

        let id_cache = Arc::clone(self.finder.id_cache());
        self.spaces
            .evictor()
            .subscribe(move |space: SpaceCore| {
                let id_cache = Arc::clone(&id_cache);
                async move {
                    tracing::debug!(space_id = space.id, "space changed, dropping cached repositories");
                    id_cache.evict_all().await;
                    Ok(())
                }
            })
            .await?;

        let id_cache = Arc::clone(self.finder.id_cache());
        self.spaces
            .evictor()
            .subscribe_resync(move || {
                let id_cache = Arc::clone(&id_cache);
                async move { id_cache.evict_all().await }
            })
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> DomainResult<Arc<RepositoryCore>> {
        self.finder.find_by_id(id).await
    }

    /// Resolve a repository ID or `<space path>/<identifier>` reference.
    pub async fn find_by_ref(&self, repo_ref: &str) -> DomainResult<Arc<RepositoryCore>> {
        self.finder
            .find_by_ref(repo_ref, |reference| self.resolve_id(reference))
            .await
    }

    async fn resolve_id(&self, reference: String) -> DomainResult<i64> {
        let (space_path, identifier) = paths::dissect_leaf(&reference)?;
        let space = self.spaces.find_by_ref(&space_path).await?;
        self.ref_cache.get(&RepoCacheKey::new(space.id, &identifier)).await
    }

    /// Find a repository soft-deleted at exactly `deleted_at`. Uncached.
    pub async fn find_deleted_by_ref(&self, repo_ref: &str, deleted_at: i64) -> DomainResult<Repository> {
        if let Some(id) = paths::parse_id(repo_ref) {
            return self.store.find_deleted(id, deleted_at).await;
        }

        let (space_path, identifier) = paths::dissect_leaf(repo_ref)?;
        let space = self
            .spaces
            .find_by_ref(&space_path)
            .await
            .with_context(|| format!("resolve space of deleted repo '{repo_ref}'"))?;
        self.store
            .find_deleted_by_identifier(space.id, &identifier, deleted_at)
            .await
    }

    pub async fn mark_changed(&self, repo: &RepositoryCore) {
        self.finder.mark_changed(repo).await;
    }

    /// Drop the ID and ref caches in this process only.
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

impl std::fmt::Debug for RepoFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoFinder").field("finder", &self.finder).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pubsub::InMemoryPubSub;
    use crate::domain::errors::ErrorKind;
    use crate::domain::ports::PubSub;
    use crate::services::test_support::{MemoryRepoStore, MemorySpaceStore};

    struct Fixture {
        spaces: Arc<MemorySpaceStore>,
        repos: Arc<MemoryRepoStore>,
        space_finder: Arc<SpaceFinder>,
        finder: RepoFinder,
    }

    async fn setup() -> Fixture {
        let bus: Arc<dyn PubSub> = Arc::new(InMemoryPubSub::default());
        let config = CacheConfig::default();
        let spaces = Arc::new(MemorySpaceStore::default());
        let repos = Arc::new(MemoryRepoStore::new(Arc::clone(&spaces)));

        let space_finder = Arc::new(SpaceFinder::new(
            spaces.clone(),
            Arc::new(Evictor::new(Arc::clone(&bus), "test", "space")),
            &config,
        ));
        space_finder.subscribe().await.unwrap();

        let finder = RepoFinder::new(
            repos.clone(),
            Arc::clone(&space_finder),
            Arc::new(Evictor::new(bus, "test", "repo")),
            &config,
        );
        finder.subscribe().await.unwrap();

        Fixture {
            spaces,
            repos,
            space_finder,
            finder,
        }
    }

    #[tokio::test]
    async fn test_find_by_ref_resolves_through_space() {
        let fx = setup().await;
        let acme = fx.spaces.insert(None, "acme");
        let team = fx.spaces.insert(Some(&acme), "team1");
        let repo = fx.repos.insert(&team, "app");

        let found = fx.finder.find_by_ref("acme/team1/App").await.unwrap();
        assert_eq!(found.id, repo.id);
        assert_eq!(found.path, "acme/team1/app");
        assert_eq!(fx.repos.calls(), 2);

        fx.finder.find_by_ref("acme/team1/app").await.unwrap();
        assert_eq!(fx.repos.calls(), 2);
        assert_eq!(fx.finder.stats().reference.unwrap().hits, 1);
    }

    #[tokio::test]
    async fn test_numeric_ref_touches_only_id_cache() {
        let fx = setup().await;
        let acme = fx.spaces.insert(None, "acme");
        let repo = fx.repos.insert(&acme, "app");

        fx.finder.find_by_ref(&repo.id.to_string()).await.unwrap();

        assert_eq!(fx.finder.stats().reference.unwrap().total(), 0);
        assert_eq!(fx.space_finder.stats().id.total(), 0);
    }

    #[tokio::test]
    async fn test_single_segment_ref_is_invalid() {
        let fx = setup().await;
        let err = fx.finder.find_by_ref("app").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[tokio::test]
    async fn test_space_change_drops_repo_paths() {
        let fx = setup().await;
        let acme = fx.spaces.insert(None, "acme");
        let repo = fx.repos.insert(&acme, "app");

        let before = fx.finder.find_by_id(repo.id).await.unwrap();
        assert_eq!(before.path, "acme/app");

        fx.spaces.rename(acme.id, "acme-corp");
        fx.space_finder.mark_changed(&acme.core()).await;

        let after = fx.finder.find_by_id(repo.id).await.unwrap();
        assert_eq!(after.path, "acme-corp/app");

        // the ref-cache is keyed by space ID and still resolves
        let by_ref = fx.finder.find_by_ref("acme-corp/app").await.unwrap();
        assert_eq!(by_ref.id, repo.id);
    }

    #[tokio::test]
    async fn test_mark_changed_drops_ref_entry() {
        let fx = setup().await;
        let acme = fx.spaces.insert(None, "acme");
        let repo = fx.repos.insert(&acme, "app");
        let core = fx.finder.find_by_ref("acme/app").await.unwrap();

        fx.repos.delete(repo.id, 1_700_000_000_000);
        fx.finder.mark_changed(&core).await;

        assert!(fx.finder.find_by_ref("acme/app").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_find_deleted_by_ref() {
        let fx = setup().await;
        let acme = fx.spaces.insert(None, "acme");
        let repo = fx.repos.insert(&acme, "app");
        fx.repos.delete(repo.id, 42);

        let deleted = fx.finder.find_deleted_by_ref("acme/app", 42).await.unwrap();
        assert_eq!(deleted.id, repo.id);
        assert_eq!(deleted.deleted, Some(42));

        let by_id = fx.finder.find_deleted_by_ref(&repo.id.to_string(), 42).await.unwrap();
        assert_eq!(by_id.id, repo.id);

        assert!(fx.finder.find_deleted_by_ref("acme/app", 43).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_flush_is_local() {
        let fx = setup().await;
        let acme = fx.spaces.insert(None, "acme");
        fx.repos.insert(&acme, "app");
        fx.finder.find_by_ref("acme/app").await.unwrap();

        fx.finder.flush().await;
        fx.finder.find_by_ref("acme/app").await.unwrap();

        assert_eq!(fx.repos.calls(), 4);
    }
}
