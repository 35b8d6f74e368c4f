//! SQLite implementation of the UpstreamProxyStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_enum};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::UpstreamProxy;
use crate::domain::ports::UpstreamProxyStore;

pub struct SqliteUpstreamProxyStore {
    pool: SqlitePool,
}

impl SqliteUpstreamProxyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UpstreamProxyStore for SqliteUpstreamProxyStore {
    async fn get_by_registry_id(&self, registry_id: i64) -> DomainResult<UpstreamProxy> {
        let row: Option<UpstreamProxyRow> = sqlx::query_as("SELECT * FROM upstream_proxies WHERE registry_id = ?")
            .bind(registry_id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DomainError::not_found("upstream-proxy", registry_id))?
            .try_into()
    }

    async fn upsert(&self, proxy: &UpstreamProxy) -> DomainResult<UpstreamProxy> {
        sqlx::query(
            r#"INSERT INTO upstream_proxies (registry_id, repo_key, source, url, auth_type, user_name, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(registry_id) DO UPDATE SET
                   repo_key = excluded.repo_key,
                   source = excluded.source,
                   url = excluded.url,
                   auth_type = excluded.auth_type,
                   user_name = excluded.user_name,
                   updated_at = excluded.updated_at"#
        )
        .bind(proxy.registry_id)
        .bind(&proxy.repo_key)
        .bind(proxy.source.as_str())
        .bind(&proxy.url)
        .bind(proxy.auth_type.as_str())
        .bind(&proxy.user_name)
        .bind(proxy.created_at.to_rfc3339())
        .bind(proxy.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_by_registry_id(proxy.registry_id).await
    }
}

#[derive(sqlx::FromRow)]
struct UpstreamProxyRow {
    id: i64,
    registry_id: i64,
    repo_key: String,
    source: String,
    url: String,
    auth_type: String,
    user_name: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UpstreamProxyRow> for UpstreamProxy {
    type Error = DomainError;

    fn try_from(row: UpstreamProxyRow) -> Result<Self, Self::Error> {
        Ok(UpstreamProxy {
            id: row.id,
            registry_id: row.registry_id,
            repo_key: row.repo_key,
            source: parse_enum("source", &row.source)?,
            url: row.url,
            auth_type: parse_enum("auth_type", &row.auth_type)?,
            user_name: row.user_name,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
