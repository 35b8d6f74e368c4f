//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::ports::CacheStats;
use crate::services::ServiceStats;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Create a borderless list table with the given headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// One row per cache of every finder.
pub fn stats_table(stats: &ServiceStats) -> Table {
    let mut table = list_table(&["cache", "hits", "misses"]);
    let rows: [(&str, Option<CacheStats>); 7] = [
        ("space_id", Some(stats.spaces.id)),
        ("space_path", stats.spaces.reference),
        ("repo_id", Some(stats.repos.id)),
        ("repo_ref", stats.repos.reference),
        ("registry_id", Some(stats.registries.id)),
        ("registry_ref", stats.registries.reference),
        ("upstream_proxy", Some(stats.upstream_proxies.id)),
    ];
    for (name, counters) in rows {
        if let Some(counters) = counters {
            table.add_row(vec![
                name.to_string(),
                counters.hits.to_string(),
                counters.misses.to_string(),
            ]);
        }
    }
    table
}
