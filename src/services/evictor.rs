//! Cross-process eviction broadcasts.
//!
//! An [`Evictor`] owns one bus topic per entity kind. Publishing a changed
//! value delivers it to every process subscribed to the topic, the
//! publisher included, where the registered callbacks drop the stale
//! cache entries.

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{LagHandler, MessageHandler, PubSub, Subscription};

/// Callback run for every eviction message received on the topic.
pub type EvictCallback<T> = Arc<dyn Fn(T) -> BoxFuture<'static, DomainResult<()>> + Send + Sync>;

/// Callback run when this process may have missed eviction messages.
pub type ResyncCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

type Callbacks<T> = Arc<RwLock<Vec<EvictCallback<T>>>>;
type ResyncCallbacks = Arc<RwLock<Vec<ResyncCallback>>>;

/// Topic carrying eviction messages for one entity kind.
pub fn topic_name(namespace: &str, entity: &str) -> String {
    format!("{namespace}/{entity}-update")
}

/// Wire envelope of an eviction message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionMessage<P> {
    /// Instance that published the message.
    pub origin: Uuid,
    pub payload: P,
}

/// Publishes and receives eviction messages of type `T`.
pub struct Evictor<T> {
    pubsub: Arc<dyn PubSub>,
    topic: String,
    instance_id: Uuid,
    callbacks: Callbacks<T>,
    resync: ResyncCallbacks,
    subscription: Mutex<Option<Subscription>>,
}

impl<T> Evictor<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(pubsub: Arc<dyn PubSub>, namespace: &str, entity: &str) -> Self {
        Self {
            pubsub,
            topic: topic_name(namespace, entity),
            instance_id: Uuid::new_v4(),
            callbacks: Arc::new(RwLock::new(Vec::new())),
            resync: Arc::new(RwLock::new(Vec::new())),
            subscription: Mutex::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Register a callback. The first registration opens the bus subscription.
    pub async fn subscribe<F, Fut>(&self, callback: F) -> DomainResult<()>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DomainResult<()>> + Send + 'static,
    {
        let callback: EvictCallback<T> = Arc::new(move |value| callback(value).boxed());
        // Registered before the subscription opens so no delivery finds an
        // empty list.
        self.callbacks.write().await.push(Arc::clone(&callback));

        if let Err(err) = self.ensure_subscribed().await {
            self.callbacks.write().await.retain(|c| !Arc::ptr_eq(c, &callback));
            return Err(err);
        }
        Ok(())
    }

    /// Register a callback run when the bus reports that messages on this
    /// topic were dropped. It should clear every cache the topic guards.
    pub async fn subscribe_resync<F, Fut>(&self, callback: F) -> DomainResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: ResyncCallback = Arc::new(move || callback().boxed());
        self.resync.write().await.push(Arc::clone(&callback));

        if let Err(err) = self.ensure_subscribed().await {
            self.resync.write().await.retain(|c| !Arc::ptr_eq(c, &callback));
            return Err(err);
        }
        Ok(())
    }

    async fn ensure_subscribed(&self) -> DomainResult<()> {
        let mut subscription = self.subscription.lock().await;
        if subscription.is_none() {
            let handle = self
                .pubsub
                .subscribe_with_lag(&self.topic, self.handler(), self.lag_handler())
                .await?;
            tracing::debug!(topic = %self.topic, "eviction subscription opened");
            *subscription = Some(handle);
        }
        Ok(())
    }

    /// Broadcast `value` to every subscribed process. Returns once the bus
    /// has taken the message out of this process.
    pub async fn evict(&self, value: &T) -> DomainResult<()> {
        let message = EvictionMessage {
            origin: self.instance_id,
            payload: value,
        };
        let payload = serde_json::to_vec(&message)?;
        self.pubsub
            .publish(&self.topic, Bytes::from(payload))
            .await
            .map_err(|e| e.context(format!("publish eviction on {}", self.topic)))?;
        self.pubsub
            .flush()
            .await
            .map_err(|e| e.context(format!("flush eviction on {}", self.topic)))
    }

    /// Run the registered callbacks in this process without going through
    /// the bus.
    pub async fn evict_local(&self, value: &T) {
        dispatch(&self.topic, &self.callbacks, value.clone()).await;
    }

    /// Number of registered callbacks.
    pub async fn callback_count(&self) -> usize {
        self.callbacks.read().await.len()
    }

    /// Close the bus subscription. Registered callbacks are kept but no
    /// longer receive remote messages.
    pub async fn close(&self) {
        if let Some(mut subscription) = self.subscription.lock().await.take() {
            subscription.close();
        }
    }

    fn lag_handler(&self) -> LagHandler {
        let resync = Arc::clone(&self.resync);
        let topic = self.topic.clone();

        Arc::new(move |skipped: u64| {
            let resync = Arc::clone(&resync);
            let topic = topic.clone();
            async move {
                tracing::warn!(topic = %topic, skipped, "eviction messages lost, resyncing caches");
                let snapshot: Vec<ResyncCallback> = resync.read().await.clone();
                for callback in snapshot {
                    callback().await;
                }
            }
            .boxed()
        })
    }

    fn handler(&self) -> MessageHandler {
        let callbacks = Arc::clone(&self.callbacks);
        let topic = self.topic.clone();

        Arc::new(move |bytes: Bytes| {
            let callbacks = Arc::clone(&callbacks);
            let topic = topic.clone();
            async move {
                match decode::<T>(&bytes) {
                    Ok(message) => {
                        tracing::trace!(topic = %topic, origin = %message.origin, "eviction received");
                        dispatch(&topic, &callbacks, message.payload).await;
                    }
                    Err(err) => {
                        tracing::warn!(topic = %topic, error = %err, "dropping undecodable eviction message");
                    }
                }
            }
            .boxed()
        })
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DomainResult<EvictionMessage<T>> {
    serde_json::from_slice(bytes).map_err(DomainError::from)
}

/// Run every callback in registration order. Failures are logged and do
/// not stop the remaining callbacks.
async fn dispatch<T: Clone>(topic: &str, callbacks: &Callbacks<T>, value: T) {
    let snapshot: Vec<EvictCallback<T>> = callbacks.read().await.clone();
    for callback in snapshot {
        if let Err(err) = callback(value.clone()).await {
            tracing::warn!(topic = %topic, error = %err, "eviction callback failed");
        }
    }
}

impl<T> std::fmt::Debug for Evictor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evictor")
            .field("topic", &self.topic)
            .field("instance_id", &self.instance_id)
            .finish_non_exhaustive()
    }
}
