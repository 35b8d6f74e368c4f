//! Generic ID-cache plus reference resolution shared by every entity finder.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::domain::errors::{DomainResult, ResultExt};
use crate::domain::models::Entity;
use crate::domain::paths;
use crate::domain::ports::{Cache, CacheStats};
use crate::services::evictor::Evictor;

/// Hit/miss counters of a finder's caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinderStats {
    pub id: CacheStats,
    /// Counters of the path or ref cache, when the finder has one.
    pub reference: Option<CacheStats>,
}

/// ID-cached lookups of `E` with change broadcasts.
pub struct Finder<E: Entity> {
    id_cache: Arc<dyn Cache<i64, Arc<E>>>,
    evictor: Arc<Evictor<E>>,
}

impl<E: Entity> Finder<E> {
    pub fn new(id_cache: Arc<dyn Cache<i64, Arc<E>>>, evictor: Arc<Evictor<E>>) -> Self {
        Self { id_cache, evictor }
    }

    pub fn id_cache(&self) -> &Arc<dyn Cache<i64, Arc<E>>> {
        &self.id_cache
    }

    pub fn evictor(&self) -> &Arc<Evictor<E>> {
        &self.evictor
    }

    pub async fn find_by_id(&self, id: i64) -> DomainResult<Arc<E>> {
        self.id_cache.get(&id).await
    }

    /// Resolve a reference. Positive integers are treated as IDs and never
    /// reach `resolve`; anything else is handed to `resolve` to map to an ID.
    pub async fn find_by_ref<F, Fut>(&self, reference: &str, resolve: F) -> DomainResult<Arc<E>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = DomainResult<i64>>,
    {
        if let Some(id) = paths::parse_id(reference) {
            return self.find_by_id(id).await;
        }

        let id = resolve(reference.to_string())
            .await
            .with_context(|| format!("resolve {} reference '{reference}'", E::KIND))?;
        self.find_by_id(id).await
    }

    /// Announce that `entity` changed. Local caches are cleared before this
    /// returns; other processes are told over the bus. A publish failure is
    /// logged, remote replicas then age out through their TTL.
    pub async fn mark_changed(&self, entity: &E) {
        self.evictor.evict_local(entity).await;
        if let Err(err) = self.evictor.evict(entity).await {
            tracing::warn!(
                kind = E::KIND,
                id = entity.cache_id(),
                error = %err,
                "failed to broadcast change"
            );
        }
    }

    /// Register the callbacks dropping the ID-cache entry of a changed
    /// entity, and the whole ID-cache when messages were lost.
    pub async fn subscribe_id_eviction(&self) -> DomainResult<()> {
        let cache = Arc::clone(&self.id_cache);
        self.evictor
            .subscribe(move |entity: E| {
                let cache = Arc::clone(&cache);
                async move {
                    cache.evict(&entity.cache_id()).await;
                    Ok(())
                }
            })
            .await?;

        let cache = Arc::clone(&self.id_cache);
        self.evictor
            .subscribe_resync(move || {
                let cache = Arc::clone(&cache);
                async move { cache.evict_all().await }
            })
            .await
    }

    /// Drop every ID-cache entry in this process only.
    pub async fn flush(&self) {
        self.id_cache.evict_all().await;
    }

    pub fn id_stats(&self) -> CacheStats {
        self.id_cache.stats()
    }
}

impl<E: Entity> std::fmt::Debug for Finder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder")
            .field("kind", &E::KIND)
            .field("evictor", &self.evictor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::TtlCache;
    use crate::adapters::pubsub::InMemoryPubSub;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::loader_fn;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Widget {
        id: i64,
        name: String,
    }

    impl Entity for Widget {
        const KIND: &'static str = "widget";

        fn cache_id(&self) -> i64 {
            self.id
        }
    }

    fn finder(loads: Arc<AtomicUsize>) -> Finder<Widget> {
        let loader = loader_fn(move |id: i64| {
            let loads = Arc::clone(&loads);
            async move {
                loads.fetch_add(1, Ordering::SeqCst);
                if id == 404 {
                    return Err(DomainError::not_found("widget", id));
                }
                Ok(Arc::new(Widget {
                    id,
                    name: format!("w{id}"),
                }))
            }
        });
        let cache = Arc::new(TtlCache::new("widget_id", loader, Duration::from_secs(60)));
        let evictor = Arc::new(Evictor::new(Arc::new(InMemoryPubSub::default()), "test", Widget::KIND));
        Finder::new(cache, evictor)
    }

    #[tokio::test]
    async fn test_numeric_reference_skips_resolver() {
        let loads = Arc::new(AtomicUsize::new(0));
        let finder = finder(Arc::clone(&loads));

        let widget = finder
            .find_by_ref("12", |_| async {
                Err(DomainError::Store("resolver must not run".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(widget.id, 12);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_path_reference_uses_resolver() {
        let finder = finder(Arc::new(AtomicUsize::new(0)));

        let widget = finder
            .find_by_ref("acme/gear", |path| async move {
                assert_eq!(path, "acme/gear");
                Ok(5)
            })
            .await
            .unwrap();

        assert_eq!(widget.name, "w5");
    }

    #[tokio::test]
    async fn test_resolver_error_gets_context() {
        let finder = finder(Arc::new(AtomicUsize::new(0)));

        let err = finder
            .find_by_ref("acme/missing", |path| async move {
                Err(DomainError::not_found("widget", path))
            })
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("resolve widget reference 'acme/missing'"));
    }

    #[tokio::test]
    async fn test_mark_changed_evicts_locally() {
        let loads = Arc::new(AtomicUsize::new(0));
        let finder = finder(Arc::clone(&loads));
        finder.subscribe_id_eviction().await.unwrap();

        let widget = finder.find_by_id(3).await.unwrap();
        finder.find_by_id(3).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        finder.mark_changed(&widget).await;
        finder.find_by_id(3).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let finder = finder(Arc::new(AtomicUsize::new(0)));
        let err = finder.find_by_id(404).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
