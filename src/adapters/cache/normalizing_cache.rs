//! Key-normalizing decorator for caches keyed by hierarchical paths.
//!
//! Every path is split into segments, each segment is passed through a
//! transform (which may treat the root segment differently), and the
//! segments are rejoined. The inner cache, and through it the loader,
//! only ever see the normalized key.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::paths::{self, PathTransformation};
use crate::domain::ports::{Cache, CacheStats};

/// Normalizes one segment; the flag is true for the root segment.
pub type SegmentTransform = Arc<dyn Fn(&str, bool) -> String + Send + Sync>;

/// Wraps a `Cache<String, V>` and canonicalizes keys before delegating.
pub struct NormalizingCache<V> {
    inner: Arc<dyn Cache<String, V>>,
    transform: SegmentTransform,
}

impl<V> NormalizingCache<V> {
    pub fn new(inner: Arc<dyn Cache<String, V>>, transform: SegmentTransform) -> Self {
        Self { inner, transform }
    }

    /// Decorate `inner` with one of the space path transformations.
    pub fn with_transformation(inner: Arc<dyn Cache<String, V>>, transformation: PathTransformation) -> Self {
        Self::new(
            inner,
            Arc::new(move |segment: &str, is_root: bool| transformation.segment(segment, is_root)),
        )
    }

    /// The key the inner cache sees for `path`.
    pub fn normalize(&self, path: &str) -> String {
        paths::normalize(path, |segment, is_root| (self.transform)(segment, is_root))
    }
}

#[async_trait]
impl<V> Cache<String, V> for NormalizingCache<V>
where
    V: Send + Sync + 'static,
{
    async fn get(&self, key: &String) -> DomainResult<V> {
        self.inner.get(&self.normalize(key)).await
    }

    fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    async fn evict(&self, key: &String) {
        self.inner.evict(&self.normalize(key)).await;
    }

    async fn evict_all(&self) {
        self.inner.evict_all().await;
    }
}

impl<V> fmt::Debug for NormalizingCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizingCache").finish_non_exhaustive()
    }
}
