//! `refcache watch`: print eviction broadcasts as they arrive.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::adapters::pubsub;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Entity, Registry, RepositoryCore, SpaceCore, UpstreamProxy};
use crate::domain::ports::{MessageHandler, Subscription};
use crate::services::{topic_name, EvictionMessage};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Exit after this many messages instead of waiting for Ctrl-C
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct WatchEvent {
    pub topic: String,
    pub origin: Uuid,
    pub payload: serde_json::Value,
}

impl WatchEvent {
    /// Decode a raw bus message; `None` for anything that is not an eviction envelope.
    pub fn decode(topic: &str, bytes: &[u8]) -> Option<Self> {
        let message: EvictionMessage<serde_json::Value> = serde_json::from_slice(bytes).ok()?;
        Some(Self {
            topic: topic.to_string(),
            origin: message.origin,
            payload: message.payload,
        })
    }
}

impl CommandOutput for WatchEvent {
    fn to_human(&self) -> String {
        let id = self
            .payload
            .get("registry_id")
            .or_else(|| self.payload.get("id"))
            .map(ToString::to_string)
            .unwrap_or_else(|| "?".to_string());
        let path = self
            .payload
            .get("path")
            .or_else(|| self.payload.get("name"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        format!("{:<28} id={id:<8} {path:<40} origin={}", self.topic, self.origin)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: WatchArgs, config: Config, json_mode: bool) -> Result<()> {
    let bus = pubsub::connect(&config.pubsub)
        .await
        .context("Failed to connect to the message bus")?;

    let namespace = config.pubsub.namespace.as_str();
    let topics = [
        topic_name(namespace, SpaceCore::KIND),
        topic_name(namespace, RepositoryCore::KIND),
        topic_name(namespace, Registry::KIND),
        topic_name(namespace, UpstreamProxy::KIND),
    ];

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut subscriptions: Vec<Subscription> = Vec::with_capacity(topics.len());
    for topic in topics {
        let tx = tx.clone();
        let handler_topic = topic.clone();
        let handler: MessageHandler = Arc::new(move |bytes: Bytes| {
            let event = WatchEvent::decode(&handler_topic, &bytes);
            let tx = tx.clone();
            async move {
                match event {
                    Some(event) => {
                        let _ = tx.send(event);
                    }
                    None => tracing::warn!("dropping undecodable eviction message"),
                }
            }
            .boxed()
        });
        subscriptions.push(bus.subscribe(&topic, handler).await?);
    }
    drop(tx);

    tracing::info!(namespace, provider = ?config.pubsub.provider, "watching eviction topics");

    let mut seen = 0usize;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                output(&event, json_mode);
                seen += 1;
                if args.count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    for subscription in &mut subscriptions {
        subscription.close();
    }
    Ok(())
}
