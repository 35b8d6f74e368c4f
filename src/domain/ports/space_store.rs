//! Space store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Space;

/// Repository interface for space persistence.
///
/// Lookups return `DomainError::NotFound` for absent or soft-deleted rows.
#[async_trait]
pub trait SpaceStore: Send + Sync {
    /// Get a live space by ID.
    async fn find(&self, id: i64) -> DomainResult<Space>;

    /// Resolve a normalized space path to the ID of a live space.
    async fn find_id_by_path(&self, normalized_path: &str) -> DomainResult<i64>;

    /// Insert a new space and return it with its assigned ID.
    async fn create(&self, space: &Space) -> DomainResult<Space>;

    /// Change a space's identifier, rewriting the paths of all descendants.
    /// Returns the updated space.
    async fn rename(&self, id: i64, identifier: &str) -> DomainResult<Space>;

    /// Soft-delete a space.
    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()>;
}
