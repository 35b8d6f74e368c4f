//! Upstream proxy store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::UpstreamProxy;

/// Repository interface for upstream proxy configuration.
#[async_trait]
pub trait UpstreamProxyStore: Send + Sync {
    /// Get the proxy configuration of an upstream registry.
    async fn get_by_registry_id(&self, registry_id: i64) -> DomainResult<UpstreamProxy>;

    /// Create or replace the proxy configuration of a registry.
    async fn upsert(&self, proxy: &UpstreamProxy) -> DomainResult<UpstreamProxy>;
}
