//! Shared setup for commands that touch the stores or the caches.

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

use crate::adapters::pubsub;
use crate::adapters::sqlite::{
    initialize_database, SqliteRegistryStore, SqliteRepoStore, SqliteSpaceStore, SqliteUpstreamProxyStore,
};
use crate::domain::models::Config;
use crate::domain::ports::PubSub;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{RefCacheService, Stores};

/// Load configuration from `--config` when given, else from the project directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            ConfigLoader::load_from_file(path)
        }
        None => ConfigLoader::load(),
    }
}

/// Open database, stores, bus and caches for one command invocation.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub stores: Stores,
    pub pubsub: Arc<dyn PubSub>,
    pub service: RefCacheService,
}

impl AppContext {
    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .context("Failed to open database. Run 'refcache init' first.")?;

        let stores = Stores {
            spaces: Arc::new(SqliteSpaceStore::new(pool.clone(), config.cache.space_path_transformation)),
            repos: Arc::new(SqliteRepoStore::new(pool.clone())),
            registries: Arc::new(SqliteRegistryStore::new(pool.clone())),
            upstream_proxies: Arc::new(SqliteUpstreamProxyStore::new(pool.clone())),
        };

        let pubsub = pubsub::connect(&config.pubsub)
            .await
            .context("Failed to connect to the message bus")?;

        let service = RefCacheService::new(&config, stores.clone(), Arc::clone(&pubsub))
            .await
            .context("Failed to start reference caches")?;

        Ok(Self {
            config,
            pool,
            stores,
            pubsub,
            service,
        })
    }
}

/// Current time in unix milliseconds, the soft-delete timestamp unit.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/refcache.yaml"))).err().unwrap();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("refcache.db").display().to_string();

        let ctx = AppContext::open(config).await.unwrap();
        assert!(dir.path().join("refcache.db").exists());
        assert_eq!(ctx.service.stats().spaces.id.total(), 0);
    }
}
