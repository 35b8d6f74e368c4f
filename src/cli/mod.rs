//! Command-line interface.
//!
//! Every command loads the layered configuration, opens the SQLite stores
//! and builds a `RefCacheService` so lookups go through the same caches a
//! server process would use.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{
    init::InitArgs, proxy::ProxyArgs, registry::RegistryArgs, repo::RepoArgs, resolve::ResolveArgs,
    space::SpaceArgs, watch::WatchArgs,
};

#[derive(Parser, Debug)]
#[command(name = "refcache")]
#[command(about = "Distributed reference-resolution cache for spaces, repositories and registries", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file to use instead of .refcache/config.yaml
    #[arg(short, long, global = true, env = "REFCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default configuration and create the database
    Init(InitArgs),

    /// Space management commands
    Space(SpaceArgs),

    /// Repository management commands
    Repo(RepoArgs),

    /// Registry management commands
    Registry(RegistryArgs),

    /// Upstream proxy management commands
    Proxy(ProxyArgs),

    /// Resolve a reference through the caches
    Resolve(ResolveArgs),

    /// Print eviction broadcasts received on the message bus
    Watch(WatchArgs),
}

/// Print a command failure and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
