//! SQLite implementation of the RepoStore.
//!
//! Repository rows do not store a path; it is built from the owning
//! space's current path on every read.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_enum};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Repository;
use crate::domain::paths;
use crate::domain::ports::RepoStore;

const SELECT_REPO: &str = "SELECT r.*, s.path AS space_path FROM repositories r JOIN spaces s ON s.id = r.parent_id";

pub struct SqliteRepoStore {
    pool: SqlitePool,
}

impl SqliteRepoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, filter: &str, binds: RepoFilter<'_>, key: impl ToString) -> DomainResult<Repository> {
        let sql = format!("{SELECT_REPO} WHERE {filter}");
        let query = sqlx::query_as::<_, RepoRow>(&sql);
        let query = match binds {
            RepoFilter::Id(id) => query.bind(id),
            RepoFilter::Deleted(id, deleted_at) => query.bind(id).bind(deleted_at),
            RepoFilter::DeletedIdentifier(space_id, identifier, deleted_at) => {
                query.bind(space_id).bind(identifier).bind(deleted_at)
            }
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.ok_or_else(|| DomainError::not_found("repo", key))?.try_into()
    }
}

enum RepoFilter<'a> {
    Id(i64),
    Deleted(i64, i64),
    DeletedIdentifier(i64, &'a str, i64),
}

#[async_trait]
impl RepoStore for SqliteRepoStore {
    async fn find(&self, id: i64) -> DomainResult<Repository> {
        self.fetch_one("r.id = ? AND r.deleted IS NULL", RepoFilter::Id(id), id)
            .await
    }

    async fn find_id_by_identifier(&self, space_id: i64, identifier: &str) -> DomainResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM repositories WHERE parent_id = ? AND lower(identifier) = lower(?) AND deleted IS NULL"
        )
        .bind(space_id)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id,)| id)
            .ok_or_else(|| DomainError::not_found("repo", format!("{space_id}/{identifier}")))
    }

    async fn find_deleted(&self, id: i64, deleted_at: i64) -> DomainResult<Repository> {
        self.fetch_one("r.id = ? AND r.deleted = ?", RepoFilter::Deleted(id, deleted_at), id)
            .await
    }

    async fn find_deleted_by_identifier(
        &self,
        space_id: i64,
        identifier: &str,
        deleted_at: i64,
    ) -> DomainResult<Repository> {
        self.fetch_one(
            "r.parent_id = ? AND lower(r.identifier) = lower(?) AND r.deleted = ?",
            RepoFilter::DeletedIdentifier(space_id, identifier, deleted_at),
            format!("{space_id}/{identifier}"),
        )
        .await
    }

    async fn create(&self, repo: &Repository) -> DomainResult<Repository> {
        let result = sqlx::query(
            r#"INSERT INTO repositories (parent_id, identifier, description, default_branch, is_public, state, fork_id, size_bytes, created, updated, deleted)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(repo.parent_id)
        .bind(&repo.identifier)
        .bind(&repo.description)
        .bind(&repo.default_branch)
        .bind(repo.is_public)
        .bind(repo.state.as_str())
        .bind(repo.fork_id)
        .bind(repo.size_bytes)
        .bind(repo.created.to_rfc3339())
        .bind(repo.updated.to_rfc3339())
        .bind(repo.deleted)
        .execute(&self.pool)
        .await?;

        self.find(result.last_insert_rowid()).await
    }

    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()> {
        let result = sqlx::query("UPDATE repositories SET deleted = ? WHERE id = ? AND deleted IS NULL")
            .bind(deleted_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("repo", id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RepoRow {
    id: i64,
    parent_id: i64,
    identifier: String,
    description: String,
    default_branch: String,
    is_public: bool,
    state: String,
    fork_id: Option<i64>,
    size_bytes: i64,
    created: String,
    updated: String,
    deleted: Option<i64>,
    space_path: String,
}

impl TryFrom<RepoRow> for Repository {
    type Error = DomainError;

    fn try_from(row: RepoRow) -> Result<Self, Self::Error> {
        Ok(Repository {
            id: row.id,
            parent_id: row.parent_id,
            path: paths::concat(&row.space_path, &row.identifier),
            identifier: row.identifier,
            description: row.description,
            default_branch: row.default_branch,
            is_public: row.is_public,
            state: parse_enum("state", &row.state)?,
            fork_id: row.fork_id,
            size_bytes: row.size_bytes,
            created: parse_datetime(&row.created)?,
            updated: parse_datetime(&row.updated)?,
            deleted: row.deleted,
        })
    }
}
