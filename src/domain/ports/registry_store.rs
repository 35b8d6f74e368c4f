//! Registry store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Registry;

/// Repository interface for artifact registry persistence.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Get a registry by ID.
    async fn get(&self, id: i64) -> DomainResult<Registry>;

    /// Resolve a registry name (case-insensitive) under a root space.
    async fn get_id_by_root_parent_id_and_name(&self, root_parent_id: i64, name: &str) -> DomainResult<i64>;

    /// Insert a new registry and return it with its assigned ID.
    async fn create(&self, registry: &Registry) -> DomainResult<Registry>;

    /// Update description, patterns and type of an existing registry.
    async fn update(&self, registry: &Registry) -> DomainResult<()>;

    /// Delete a registry and its upstream proxy configuration.
    async fn delete(&self, id: i64) -> DomainResult<()>;
}
