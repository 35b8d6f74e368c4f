use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, PubSubProvider};

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".refcache";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "REFCACHE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {0}: TTL must be at least 1 second")]
    InvalidTtl(&'static str),

    #[error("Invalid max_capacity: must be at least 1 when set")]
    InvalidMaxCapacity,

    #[error("PubSub namespace cannot be empty")]
    EmptyNamespace,

    #[error("Invalid channel_capacity: {0}. Must be at least 1")]
    InvalidChannelCapacity(usize),

    #[error("nats_url is required when the pubsub provider is nats")]
    MissingNatsUrl,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid acquire_timeout_secs: must be at least 1 second")]
    InvalidAcquireTimeout,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .refcache/config.yaml (created by init)
    /// 3. .refcache/local.yaml (optional local overrides)
    /// 4. Environment variables (REFCACHE_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration rooted at `root` instead of the current directory.
    pub fn load_from(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let cache = &config.cache;
        for (name, ttl) in [
            ("space_ttl_secs", cache.space_ttl_secs),
            ("repo_ttl_secs", cache.repo_ttl_secs),
            ("registry_ttl_secs", cache.registry_ttl_secs),
        ] {
            if ttl == 0 {
                return Err(ConfigError::InvalidTtl(name));
            }
        }

        if cache.max_capacity == Some(0) {
            return Err(ConfigError::InvalidMaxCapacity);
        }

        let pubsub = &config.pubsub;
        if pubsub.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }

        if pubsub.channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity(pubsub.channel_capacity));
        }

        if pubsub.provider == PubSubProvider::Nats
            && pubsub.nats_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingNatsUrl);
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if config.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidAcquireTimeout);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }

    /// Default configuration rendered as YAML, written by `init`.
    pub fn default_yaml() -> Result<String> {
        serde_yaml::to_string(&Config::default()).context("Failed to render default configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::paths::PathTransformation;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.space_ttl_secs, 900);
        assert_eq!(config.cache.registry_ttl_secs, 300);
        assert_eq!(config.pubsub.namespace, "refcache");
        assert_eq!(config.database.path, ".refcache/refcache.db");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
cache:
  repo_ttl_secs: 60
  max_capacity: 5000
  space_path_transformation: case_sensitive_root
pubsub:
  provider: nats
  namespace: prod
  nats_url: nats://127.0.0.1:4222
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.cache.repo_ttl_secs, 60);
        assert_eq!(config.cache.space_ttl_secs, 900);
        assert_eq!(config.cache.max_capacity, Some(5000));
        assert_eq!(config.cache.space_path_transformation, PathTransformation::CaseSensitiveRoot);
        assert_eq!(config.pubsub.provider, PubSubProvider::Nats);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_local_file_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.yaml"), "cache:\n  space_ttl_secs: 120\n  repo_ttl_secs: 120\n").unwrap();
        fs::write(config_dir.join("local.yaml"), "cache:\n  repo_ttl_secs: 30\n").unwrap();

        let config = temp_env::with_var_unset("REFCACHE_CACHE__REPO_TTL_SECS", || {
            ConfigLoader::load_from(dir.path()).unwrap()
        });

        assert_eq!(config.cache.space_ttl_secs, 120);
        assert_eq!(config.cache.repo_ttl_secs, 30);
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.yaml"), "pubsub:\n  namespace: from-file\n").unwrap();

        let config = temp_env::with_vars(
            [
                ("REFCACHE_PUBSUB__NAMESPACE", Some("from-env")),
                ("REFCACHE_CACHE__REGISTRY_TTL_SECS", Some("42")),
            ],
            || ConfigLoader::load_from(dir.path()).unwrap(),
        );

        assert_eq!(config.pubsub.namespace, "from-env");
        assert_eq!(config.cache.registry_ttl_secs, 42);
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "cache:\n  space_ttl_secs: 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("space_ttl_secs"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.cache.repo_ttl_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTtl("repo_ttl_secs"))
        ));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default();
        config.cache.max_capacity = Some(0);

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxCapacity)
        ));
    }

    #[test]
    fn test_validate_nats_requires_url() {
        let mut config = Config::default();
        config.pubsub.provider = PubSubProvider::Nats;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingNatsUrl)
        ));

        config.pubsub.nats_url = Some("nats://localhost:4222".to_string());
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_namespace() {
        let mut config = Config::default();
        config.pubsub.namespace = "  ".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyNamespace)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabasePath)
        ));
    }

    #[test]
    fn test_validate_zero_acquire_timeout() {
        let mut config = Config::default();
        config.database.acquire_timeout_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidAcquireTimeout)
        ));
    }

    #[test]
    fn test_default_yaml_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, ConfigLoader::default_yaml().unwrap()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.cache.repo_ttl_secs, Config::default().cache.repo_ttl_secs);
    }
}
