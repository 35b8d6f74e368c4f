//! NATS-backed pub/sub for multi-instance deployments.
//!
//! Uses core NATS subjects (no JetStream): delivery is at-most-once per
//! connection, which the evictor tolerates because cache entries also
//! expire by TTL.

use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{MessageHandler, PubSub, Subscription};

/// Keep-alive interval for the NATS connection
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);

/// Fail fast when the server is unreachable at startup
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// NATS client wrapper implementing [`PubSub`].
#[derive(Clone)]
pub struct NatsPubSub {
    client: Client,
}

impl NatsPubSub {
    /// Connect to the NATS server at `url`.
    pub async fn connect(url: &str, name: &str) -> DomainResult<Self> {
        info!(url, "connecting to NATS");

        let client = ConnectOptions::new()
            .name(name)
            .ping_interval(DEFAULT_PING_INTERVAL)
            .connection_timeout(DEFAULT_CONNECTION_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| DomainError::PubSub(format!("Failed to connect to {url}: {e}")))?;

        info!(url, "connected to NATS");
        Ok(Self { client })
    }

    /// Wrap an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PubSub for NatsPubSub {
    async fn publish(&self, topic: &str, payload: Bytes) -> DomainResult<()> {
        self.client
            .publish(topic.to_string(), payload)
            .await
            .map_err(|e| DomainError::PubSub(format!("Publish to {topic} failed: {e}")))
    }

    /// `publish` only queues on the client; this waits for the server to
    /// have received everything queued so far.
    async fn flush(&self) -> DomainResult<()> {
        self.client
            .flush()
            .await
            .map_err(|e| DomainError::PubSub(format!("Flush failed: {e}")))
    }

    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> DomainResult<Subscription> {
        let mut subscriber = self
            .client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| DomainError::PubSub(format!("Subscribe to {topic} failed: {e}")))?;
        let name = topic.to_string();

        let task = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                handler(message.payload).await;
            }
            tracing::warn!(topic = %name, "NATS subscription ended");
        });

        info!(topic, "subscribed to NATS subject");
        Ok(Subscription::new(topic, task))
    }
}
