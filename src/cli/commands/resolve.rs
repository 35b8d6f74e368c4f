//! `refcache resolve`: look a reference up through the caches.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::cli::context::AppContext;
use crate::cli::output::{output, stats_table, CommandOutput};
use crate::domain::models::Config;
use crate::services::{RefCacheService, ServiceStats};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Space,
    Repo,
    Registry,
    Proxy,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Kind of entity the reference names
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Path reference or numeric ID
    pub reference: String,

    /// Resolve the reference this many times to observe cache hits
    #[arg(short = 'n', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub kind: EntityKind,
    pub reference: String,
    pub entity: serde_json::Value,
    pub attempts: u32,
    pub first_micros: u64,
    /// Mean latency of the attempts after the first.
    pub warm_avg_micros: Option<u64>,
    pub stats: ServiceStats,
}

impl CommandOutput for ResolveOutput {
    fn to_human(&self) -> String {
        let entity = serde_json::to_string_pretty(&self.entity).unwrap_or_default();
        let mut lines = vec![
            format!("Resolved {:?} '{}':", self.kind, self.reference),
            entity,
            String::new(),
            format!("First lookup: {}us", self.first_micros),
        ];
        if let Some(avg) = self.warm_avg_micros {
            lines.push(format!("Warm lookups: {} x {avg}us avg", self.attempts - 1));
        }
        lines.push(String::new());
        lines.push(stats_table(&self.stats).to_string());
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Resolve one reference and render the entity as JSON.
pub async fn resolve_once(
    service: &RefCacheService,
    kind: EntityKind,
    reference: &str,
) -> Result<serde_json::Value> {
    let value = match kind {
        EntityKind::Space => serde_json::to_value(service.spaces.find_by_ref(reference).await?)?,
        EntityKind::Repo => serde_json::to_value(service.repos.find_by_ref(reference).await?)?,
        EntityKind::Registry => serde_json::to_value(service.registries.find_by_ref(reference).await?)?,
        EntityKind::Proxy => serde_json::to_value(service.upstream_proxies.find_by_ref(reference).await?)?,
    };
    Ok(value)
}

pub async fn execute(args: ResolveArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    let mut entity = serde_json::Value::Null;
    let mut timings = Vec::with_capacity(args.repeat as usize);
    for _ in 0..args.repeat {
        let started = Instant::now();
        entity = resolve_once(&ctx.service, args.kind, &args.reference).await?;
        timings.push(started.elapsed());
    }

    let first_micros = timings.first().map_or(0, micros);
    let warm = &timings[1..];
    let warm_avg_micros = if warm.is_empty() {
        None
    } else {
        let total: Duration = warm.iter().sum();
        Some(micros(&total) / warm.len() as u64)
    };

    let result = ResolveOutput {
        kind: args.kind,
        reference: args.reference,
        entity,
        attempts: args.repeat,
        first_micros,
        warm_avg_micros,
        stats: ctx.service.stats(),
    };

    output(&result, json_mode);
    Ok(())
}

fn micros(duration: &Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
