use serde::{Deserialize, Serialize};

use crate::domain::paths::PathTransformation;

/// Main configuration structure for the reference cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Cache TTLs and key normalization
    #[serde(default)]
    pub cache: CacheConfig,

    /// Invalidation bus configuration
    #[serde(default)]
    pub pubsub: PubSubConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// TTL of the space ID-cache and the space path cache
    #[serde(default = "default_space_ttl_secs")]
    pub space_ttl_secs: u64,

    /// TTL of the repository ID-cache and ref-cache
    #[serde(default = "default_repo_ttl_secs")]
    pub repo_ttl_secs: u64,

    /// TTL of the registry and upstream proxy caches
    #[serde(default = "default_registry_ttl_secs")]
    pub registry_ttl_secs: u64,

    /// Optional bound on entries per cache; unbounded when absent
    #[serde(default)]
    pub max_capacity: Option<u64>,

    /// How space path segments are canonicalized
    #[serde(default)]
    pub space_path_transformation: PathTransformation,
}

const fn default_space_ttl_secs() -> u64 {
    15 * 60
}

const fn default_repo_ttl_secs() -> u64 {
    15 * 60
}

const fn default_registry_ttl_secs() -> u64 {
    5 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            space_ttl_secs: default_space_ttl_secs(),
            repo_ttl_secs: default_repo_ttl_secs(),
            registry_ttl_secs: default_registry_ttl_secs(),
            max_capacity: None,
            space_path_transformation: PathTransformation::default(),
        }
    }
}

/// Which message bus carries invalidation broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PubSubProvider {
    /// In-process fan-out, for single-instance deployments
    #[default]
    Inmemory,
    /// NATS core pub/sub, for multi-instance deployments
    Nats,
}

/// Invalidation bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PubSubConfig {
    #[serde(default)]
    pub provider: PubSubProvider,

    /// Prefix of every topic, separating deployments that share one bus
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Per-topic channel capacity of the in-memory bus
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// NATS server URL, required when provider is `nats`
    #[serde(default)]
    pub nats_url: Option<String>,

    /// Client name reported to the NATS server
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

fn default_namespace() -> String {
    "refcache".to_string()
}

const fn default_channel_capacity() -> usize {
    1024
}

fn default_client_name() -> String {
    "refcache".to_string()
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            provider: PubSubProvider::default(),
            namespace: default_namespace(),
            channel_capacity: default_channel_capacity(),
            nats_url: None,
            client_name: default_client_name(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a free pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Seconds a statement waits on a locked database before failing
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_database_path() -> String {
    ".refcache/refcache.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    3
}

const fn default_busy_timeout_secs() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; console only when absent
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
