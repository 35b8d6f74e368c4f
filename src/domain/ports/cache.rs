//! Cache and loader ports.

use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::domain::errors::DomainResult;

/// Cumulative hit/miss counters of a cache. Both only ever increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Total number of `get` calls observed.
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Concurrency-safe cache with load-on-miss.
///
/// Cancelling a `get` (dropping its future) only abandons that caller's
/// wait; a load shared with other callers keeps running.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    /// Return the cached value, loading it on a miss.
    async fn get(&self, key: &K) -> DomainResult<V>;

    /// Hit/miss counters, one increment per `get`.
    fn stats(&self) -> CacheStats;

    /// Remove one entry. Evicting an absent key is a no-op.
    async fn evict(&self, key: &K);

    /// Remove every entry.
    async fn evict_all(&self);
}

/// Source of truth consulted by a cache on a miss.
#[async_trait]
pub trait Loader<K, V>: Send + Sync {
    async fn find(&self, key: &K) -> DomainResult<V>;
}

/// Adapts an async closure into a [`Loader`].
pub struct LoaderFn<F>(pub F);

#[async_trait]
impl<K, V, F, Fut> Loader<K, V> for LoaderFn<F>
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = DomainResult<V>> + Send,
{
    async fn find(&self, key: &K) -> DomainResult<V> {
        (self.0)(key.clone()).await
    }
}

/// Box an async closure as a shared loader.
pub fn loader_fn<K, V, F, Fut>(f: F) -> Arc<dyn Loader<K, V>>
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DomainResult<V>> + Send + 'static,
{
    Arc::new(LoaderFn(f))
}
