//! Common test utilities for integration tests
//!
//! Counting wrappers around the SQLite stores, so tests can assert how
//! often a lookup actually reached the store.

#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use refcache::adapters::pubsub::InMemoryPubSub;
use refcache::adapters::sqlite::{
    create_migrated_test_pool, SqliteRegistryStore, SqliteRepoStore, SqliteSpaceStore, SqliteUpstreamProxyStore,
};
use refcache::domain::errors::DomainResult;
use refcache::domain::models::{Config, Repository, Space};
use refcache::domain::paths::PathTransformation;
use refcache::domain::ports::{PubSub, RepoStore, SpaceStore};
use refcache::services::{RefCacheService, Stores};

/// Counts read calls that reach the wrapped space store.
pub struct CountingSpaceStore {
    inner: SqliteSpaceStore,
    calls: AtomicUsize,
}

impl CountingSpaceStore {
    pub fn new(inner: SqliteSpaceStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpaceStore for CountingSpaceStore {
    async fn find(&self, id: i64) -> DomainResult<Space> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find(id).await
    }

    async fn find_id_by_path(&self, normalized_path: &str) -> DomainResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_id_by_path(normalized_path).await
    }

    async fn create(&self, space: &Space) -> DomainResult<Space> {
        self.inner.create(space).await
    }

    async fn rename(&self, id: i64, identifier: &str) -> DomainResult<Space> {
        self.inner.rename(id, identifier).await
    }

    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()> {
        self.inner.soft_delete(id, deleted_at).await
    }
}

/// Counts read calls that reach the wrapped repository store.
pub struct CountingRepoStore {
    inner: SqliteRepoStore,
    calls: AtomicUsize,
}

impl CountingRepoStore {
    pub fn new(inner: SqliteRepoStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoStore for CountingRepoStore {
    async fn find(&self, id: i64) -> DomainResult<Repository> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find(id).await
    }

    async fn find_id_by_identifier(&self, space_id: i64, identifier: &str) -> DomainResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_id_by_identifier(space_id, identifier).await
    }

    async fn find_deleted(&self, id: i64, deleted_at: i64) -> DomainResult<Repository> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_deleted(id, deleted_at).await
    }

    async fn find_deleted_by_identifier(
        &self,
        space_id: i64,
        identifier: &str,
        deleted_at: i64,
    ) -> DomainResult<Repository> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .find_deleted_by_identifier(space_id, identifier, deleted_at)
            .await
    }

    async fn create(&self, repo: &Repository) -> DomainResult<Repository> {
        self.inner.create(repo).await
    }

    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()> {
        self.inner.soft_delete(id, deleted_at).await
    }
}

/// One in-memory database shared by every simulated process.
pub struct TestBackend {
    pub pool: SqlitePool,
    pub config: Config,
    pub pubsub: Arc<dyn PubSub>,
}

impl TestBackend {
    pub async fn new() -> Self {
        Self::with_transformation(PathTransformation::CaseInsensitive).await
    }

    pub async fn with_transformation(transformation: PathTransformation) -> Self {
        let mut config = Config::default();
        config.cache.space_path_transformation = transformation;
        Self {
            pool: create_migrated_test_pool().await.expect("test pool"),
            config,
            pubsub: Arc::new(InMemoryPubSub::new(64)),
        }
    }

    /// Start one "process": its own caches over the shared database and bus.
    pub async fn process(&self) -> TestProcess {
        let transformation = self.config.cache.space_path_transformation;
        let spaces = Arc::new(CountingSpaceStore::new(SqliteSpaceStore::new(self.pool.clone(), transformation)));
        let repos = Arc::new(CountingRepoStore::new(SqliteRepoStore::new(self.pool.clone())));
        let stores = Stores {
            spaces: spaces.clone(),
            repos: repos.clone(),
            registries: Arc::new(SqliteRegistryStore::new(self.pool.clone())),
            upstream_proxies: Arc::new(SqliteUpstreamProxyStore::new(self.pool.clone())),
        };
        let service = RefCacheService::new(&self.config, stores.clone(), Arc::clone(&self.pubsub))
            .await
            .expect("service");

        TestProcess {
            service,
            stores,
            space_calls: spaces,
            repo_calls: repos,
        }
    }
}

pub struct TestProcess {
    pub service: RefCacheService,
    pub stores: Stores,
    pub space_calls: Arc<CountingSpaceStore>,
    pub repo_calls: Arc<CountingRepoStore>,
}

/// Poll `predicate` every 10ms until it holds or `timeout` passes.
pub async fn wait_for<F>(mut predicate: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}
