//! In-process pub/sub built on tokio broadcast channels, one per topic.
//!
//! Suitable for single-instance deployments and tests: every subscriber
//! in the process, including the publisher's own, receives each message.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use crate::domain::errors::DomainResult;
use crate::domain::ports::{LagHandler, MessageHandler, PubSub, Subscription};

/// Topic fan-out over `tokio::sync::broadcast`.
pub struct InMemoryPubSub {
    topics: RwLock<HashMap<String, broadcast::Sender<Bytes>>>,
    capacity: usize,
}

impl InMemoryPubSub {
    /// Create a bus whose per-topic channels buffer `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<Bytes> {
        if let Some(sender) = self.topics.read().await.get(topic) {
            return sender.clone();
        }
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of active subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl PubSub for InMemoryPubSub {
    async fn publish(&self, topic: &str, payload: Bytes) -> DomainResult<()> {
        // No subscribers is not an error: nobody holds a copy to invalidate.
        let delivered = self.sender(topic).await.send(payload).unwrap_or(0);
        tracing::trace!(topic, delivered, "published");
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> DomainResult<Subscription> {
        self.spawn_subscription(topic, handler, None).await
    }

    async fn subscribe_with_lag(
        &self,
        topic: &str,
        handler: MessageHandler,
        on_lag: LagHandler,
    ) -> DomainResult<Subscription> {
        self.spawn_subscription(topic, handler, Some(on_lag)).await
    }
}

impl InMemoryPubSub {
    async fn spawn_subscription(
        &self,
        topic: &str,
        handler: MessageHandler,
        on_lag: Option<LagHandler>,
    ) -> DomainResult<Subscription> {
        let mut receiver = self.sender(topic).await.subscribe();
        let name = topic.to_string();

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(payload) => handler(payload).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(topic = %name, skipped, "subscriber lagged, messages dropped");
                        if let Some(on_lag) = &on_lag {
                            on_lag(skipped).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        tracing::debug!(topic, "subscribed");
        Ok(Subscription::new(topic, task))
    }
}
