//! Message bus port used for cross-process cache invalidation.
//!
//! Delivery is at-least-once and unordered; handlers must be idempotent.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::domain::errors::DomainResult;

/// Callback invoked for every message received on a topic.
pub type MessageHandler = Arc<dyn Fn(Bytes) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked with the number of messages a subscriber missed.
pub type LagHandler = Arc<dyn Fn(u64) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle to an active topic subscription.
///
/// The delivery task is aborted when the handle is closed or dropped.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, task: JoinHandle<()>) -> Self {
        Self {
            topic: topic.into(),
            task: Some(task),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_closed(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop receiving messages.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(topic = %self.topic, "subscription closed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Topic-based publish/subscribe bus.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publish a payload to every subscriber of `topic`, in every process.
    async fn publish(&self, topic: &str, payload: Bytes) -> DomainResult<()>;

    /// Register `handler` for messages on `topic`.
    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> DomainResult<Subscription>;

    /// Like [`PubSub::subscribe`], and additionally call `on_lag` when the
    /// bus knows this subscriber dropped messages. Buses that cannot detect
    /// loss ignore `on_lag`.
    async fn subscribe_with_lag(
        &self,
        topic: &str,
        handler: MessageHandler,
        _on_lag: LagHandler,
    ) -> DomainResult<Subscription> {
        self.subscribe(topic, handler).await
    }

    /// Wait until every message published so far has left this process.
    async fn flush(&self) -> DomainResult<()> {
        Ok(())
    }
}
