//! Generic TTL cache with load-on-miss and single-flight loading.
//!
//! Entries live in a moka cache configured with `time_to_live`, so expiry
//! is absolute from insertion and reads never extend it. Misses are
//! coalesced: at most one loader call per key runs at any time, and every
//! caller waiting on that key receives the same result.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache as MokaCache;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{Cache, CacheStats, Loader};

type LoadFuture<V> = Shared<BoxFuture<'static, DomainResult<V>>>;

struct InFlight<V> {
    token: u64,
    load: LoadFuture<V>,
    /// Set when the key is evicted while the load runs. The result is then
    /// handed to the callers already waiting but never stored.
    superseded: bool,
}

type InFlightMap<K, V> = Arc<Mutex<HashMap<K, InFlight<V>>>>;

/// TTL cache over a [`Loader`].
pub struct TtlCache<K, V> {
    name: String,
    ttl: Duration,
    loader: Arc<dyn Loader<K, V>>,
    entries: MokaCache<K, V>,
    in_flight: InFlightMap<K, V>,
    next_token: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an unbounded cache.
    pub fn new(name: impl Into<String>, loader: Arc<dyn Loader<K, V>>, ttl: Duration) -> Self {
        Self::with_capacity(name, loader, ttl, None)
    }

    /// Create a cache, optionally bounded to `max_capacity` entries.
    pub fn with_capacity(
        name: impl Into<String>,
        loader: Arc<dyn Loader<K, V>>,
        ttl: Duration,
        max_capacity: Option<u64>,
    ) -> Self {
        let mut builder = MokaCache::builder().time_to_live(ttl);
        if let Some(capacity) = max_capacity {
            builder = builder.max_capacity(capacity);
        }

        Self {
            name: name.into(),
            ttl,
            loader,
            entries: builder.build(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns true if an unexpired entry exists. Does not touch the stats.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Start a load for `key` on its own task. If `previous` is set (an
    /// evicted load still running) the new load waits for it first, so two
    /// loader calls for one key never overlap.
    fn spawn_load(&self, key: K, token: u64, previous: Option<LoadFuture<V>>) -> LoadFuture<V> {
        let loader = Arc::clone(&self.loader);
        let entries = self.entries.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let name = self.name.clone();

        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }

            let result = match AssertUnwindSafe(loader.find(&key)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(DomainError::LoadAborted(format!(
                    "{name} loader panicked for key {key:?}"
                ))),
            };

            let mut in_flight = in_flight.lock().await;
            let current = in_flight.get(&key).is_some_and(|f| f.token == token);
            if current {
                let finished = in_flight.remove(&key);
                let superseded = finished.is_some_and(|f| f.superseded);
                if let (Ok(value), false) = (&result, superseded) {
                    entries.insert(key.clone(), value.clone()).await;
                }
            }
            drop(in_flight);

            match &result {
                Ok(_) => tracing::trace!(cache = %name, key = ?key, "loaded"),
                Err(err) => tracing::debug!(cache = %name, key = ?key, error = %err, "load failed"),
            }
            result
        });

        async move {
            task.await
                .unwrap_or_else(|err| Err(DomainError::LoadAborted(err.to_string())))
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for TtlCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> DomainResult<V> {
        if let Some(value) = self.entries.get(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        let load = {
            let mut in_flight = self.in_flight.lock().await;

            // A load may have completed between the first check and the lock.
            if let Some(value) = self.entries.get(key).await {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);

            match in_flight.get(key) {
                Some(existing) if !existing.superseded => {
                    tracing::trace!(cache = %self.name, key = ?key, "joining in-flight load");
                    existing.load.clone()
                }
                existing => {
                    let previous = existing.map(|f| f.load.clone());
                    let token = self.next_token.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(cache = %self.name, key = ?key, "cache miss");
                    let load = self.spawn_load(key.clone(), token, previous);
                    in_flight.insert(
                        key.clone(),
                        InFlight {
                            token,
                            load: load.clone(),
                            superseded: false,
                        },
                    );
                    load
                }
            }
        };

        load.await
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn evict(&self, key: &K) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(pending) = in_flight.get_mut(key) {
            pending.superseded = true;
        }
        self.entries.invalidate(key).await;
        tracing::trace!(cache = %self.name, key = ?key, "evicted");
    }

    async fn evict_all(&self) {
        let mut in_flight = self.in_flight.lock().await;
        for pending in in_flight.values_mut() {
            pending.superseded = true;
        }
        self.entries.invalidate_all();
        tracing::debug!(cache = %self.name, "evicted all entries");
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
