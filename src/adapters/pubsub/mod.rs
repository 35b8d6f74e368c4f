//! Message bus adapters for cache invalidation broadcasts.

pub mod in_memory;
pub mod nats;

pub use in_memory::InMemoryPubSub;
pub use nats::NatsPubSub;

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PubSubConfig, PubSubProvider};
use crate::domain::ports::PubSub;

/// Build the bus selected by configuration.
pub async fn connect(config: &PubSubConfig) -> DomainResult<Arc<dyn PubSub>> {
    match config.provider {
        PubSubProvider::Inmemory => Ok(Arc::new(InMemoryPubSub::new(config.channel_capacity))),
        PubSubProvider::Nats => {
            let url = config
                .nats_url
                .as_deref()
                .ok_or_else(|| DomainError::PubSub("nats_url is required for the nats provider".to_string()))?;
            Ok(Arc::new(NatsPubSub::connect(url, &config.client_name).await?))
        }
    }
}
