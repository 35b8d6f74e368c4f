//! Repository store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Repository;

/// Repository interface for repository persistence.
#[async_trait]
pub trait RepoStore: Send + Sync {
    /// Get a live repository by ID. The path reflects current ancestor paths.
    async fn find(&self, id: i64) -> DomainResult<Repository>;

    /// Resolve a repository identifier (case-insensitive) inside a space.
    async fn find_id_by_identifier(&self, space_id: i64, identifier: &str) -> DomainResult<i64>;

    /// Get a repository soft-deleted at exactly `deleted_at`.
    async fn find_deleted(&self, id: i64, deleted_at: i64) -> DomainResult<Repository>;

    /// Get a repository by identifier that was soft-deleted at exactly `deleted_at`.
    async fn find_deleted_by_identifier(
        &self,
        space_id: i64,
        identifier: &str,
        deleted_at: i64,
    ) -> DomainResult<Repository>;

    /// Insert a new repository and return it with its assigned ID.
    async fn create(&self, repo: &Repository) -> DomainResult<Repository>;

    /// Soft-delete a repository.
    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()>;
}
