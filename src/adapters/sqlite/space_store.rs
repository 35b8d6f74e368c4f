//! SQLite implementation of the SpaceStore.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::adapters::sqlite::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Space;
use crate::domain::paths::{self, PathTransformation};
use crate::domain::ports::SpaceStore;

pub struct SqliteSpaceStore {
    pool: SqlitePool,
    transformation: PathTransformation,
}

impl SqliteSpaceStore {
    /// `transformation` must match the one the space path cache uses.
    pub fn new(pool: SqlitePool, transformation: PathTransformation) -> Self {
        Self { pool, transformation }
    }
}

#[async_trait]
impl SpaceStore for SqliteSpaceStore {
    async fn find(&self, id: i64) -> DomainResult<Space> {
        let row: Option<SpaceRow> = sqlx::query_as(
            "SELECT * FROM spaces WHERE id = ? AND deleted IS NULL"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DomainError::not_found("space", id))?.try_into()
    }

    async fn find_id_by_path(&self, normalized_path: &str) -> DomainResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM spaces WHERE path_unique = ? AND deleted IS NULL"
        )
        .bind(normalized_path)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id,)| id)
            .ok_or_else(|| DomainError::not_found("space", normalized_path))
    }

    async fn create(&self, space: &Space) -> DomainResult<Space> {
        let result = sqlx::query(
            r#"INSERT INTO spaces (parent_id, identifier, path, path_unique, description, is_public, created, updated, deleted)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(space.parent_id)
        .bind(&space.identifier)
        .bind(&space.path)
        .bind(self.transformation.apply(&space.path))
        .bind(&space.description)
        .bind(space.is_public)
        .bind(space.created.to_rfc3339())
        .bind(space.updated.to_rfc3339())
        .bind(space.deleted)
        .execute(&self.pool)
        .await?;

        Ok(Space {
            id: result.last_insert_rowid(),
            ..space.clone()
        })
    }

    async fn rename(&self, id: i64, identifier: &str) -> DomainResult<Space> {
        let mut tx = self.pool.begin().await?;

        let (old_path,): (String,) = sqlx::query_as("SELECT path FROM spaces WHERE id = ? AND deleted IS NULL")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DomainError::not_found("space", id))?;

        let parent_path = paths::dissect_leaf(&old_path).map(|(parent, _)| parent).unwrap_or_default();
        let new_path = paths::concat(&parent_path, identifier);
        let now = Utc::now().to_rfc3339();

        // The space itself and every descendant, live or deleted.
        let affected: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, path FROM spaces WHERE id = ? OR substr(path, 1, length(?) + 1) = ? || '/'"
        )
        .bind(id)
        .bind(&old_path)
        .bind(&old_path)
        .fetch_all(&mut *tx)
        .await?;

        for (space_id, path) in affected {
            let rewritten = match path.strip_prefix(old_path.as_str()) {
                Some(rest) => format!("{new_path}{rest}"),
                None => new_path.clone(),
            };
            sqlx::query("UPDATE spaces SET path = ?, path_unique = ?, updated = ? WHERE id = ?")
                .bind(&rewritten)
                .bind(self.transformation.apply(&rewritten))
                .bind(&now)
                .bind(space_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE spaces SET identifier = ? WHERE id = ?")
            .bind(identifier)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.find(id).await
    }

    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()> {
        let result = sqlx::query("UPDATE spaces SET deleted = ? WHERE id = ? AND deleted IS NULL")
            .bind(deleted_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("space", id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SpaceRow {
    id: i64,
    parent_id: Option<i64>,
    identifier: String,
    path: String,
    description: String,
    is_public: bool,
    created: String,
    updated: String,
    deleted: Option<i64>,
}

impl TryFrom<SpaceRow> for Space {
    type Error = DomainError;

    fn try_from(row: SpaceRow) -> Result<Self, Self::Error> {
        Ok(Space {
            id: row.id,
            parent_id: row.parent_id,
            path: row.path,
            identifier: row.identifier,
            description: row.description,
            is_public: row.is_public,
            created: parse_datetime(&row.created)?,
            updated: parse_datetime(&row.updated)?,
            deleted: row.deleted,
        })
    }
}
