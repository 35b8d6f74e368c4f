//! SQLite implementation of the RegistryStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_enum, parse_json_or_default};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Registry;
use crate::domain::ports::RegistryStore;

pub struct SqliteRegistryStore {
    pool: SqlitePool,
}

impl SqliteRegistryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryStore for SqliteRegistryStore {
    async fn get(&self, id: i64) -> DomainResult<Registry> {
        let row: Option<RegistryRow> = sqlx::query_as("SELECT * FROM registries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DomainError::not_found("registry", id))?.try_into()
    }

    async fn get_id_by_root_parent_id_and_name(&self, root_parent_id: i64, name: &str) -> DomainResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM registries WHERE root_parent_id = ? AND lower(name) = lower(?)"
        )
        .bind(root_parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id,)| id)
            .ok_or_else(|| DomainError::not_found("registry", format!("{root_parent_id}/{name}")))
    }

    async fn create(&self, registry: &Registry) -> DomainResult<Registry> {
        let result = sqlx::query(
            r#"INSERT INTO registries (name, root_parent_id, parent_id, description, package_type, registry_type, allowed_pattern, blocked_pattern, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(&registry.name)
        .bind(registry.root_parent_id)
        .bind(registry.parent_id)
        .bind(&registry.description)
        .bind(registry.package_type.as_str())
        .bind(registry.registry_type.as_str())
        .bind(serde_json::to_string(&registry.allowed_pattern)?)
        .bind(serde_json::to_string(&registry.blocked_pattern)?)
        .bind(registry.created_at.to_rfc3339())
        .bind(registry.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Registry {
            id: result.last_insert_rowid(),
            ..registry.clone()
        })
    }

    async fn update(&self, registry: &Registry) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE registries SET description = ?, registry_type = ?, allowed_pattern = ?, blocked_pattern = ?, updated_at = ?
               WHERE id = ?"#
        )
        .bind(&registry.description)
        .bind(registry.registry_type.as_str())
        .bind(serde_json::to_string(&registry.allowed_pattern)?)
        .bind(serde_json::to_string(&registry.blocked_pattern)?)
        .bind(registry.updated_at.to_rfc3339())
        .bind(registry.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("registry", registry.id));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM registries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("registry", id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RegistryRow {
    id: i64,
    name: String,
    root_parent_id: i64,
    parent_id: i64,
    description: String,
    package_type: String,
    registry_type: String,
    allowed_pattern: Option<String>,
    blocked_pattern: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RegistryRow> for Registry {
    type Error = DomainError;

    fn try_from(row: RegistryRow) -> Result<Self, Self::Error> {
        Ok(Registry {
            id: row.id,
            name: row.name,
            root_parent_id: row.root_parent_id,
            parent_id: row.parent_id,
            description: row.description,
            package_type: parse_enum("package_type", &row.package_type)?,
            registry_type: parse_enum("registry_type", &row.registry_type)?,
            allowed_pattern: parse_json_or_default(row.allowed_pattern)?,
            blocked_pattern: parse_json_or_default(row.blocked_pattern)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
