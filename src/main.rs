//! refcache CLI entry point.

use clap::Parser;

use refcache::cli::commands;
use refcache::cli::context::load_config;
use refcache::cli::{handle_error, Cli, Commands};
use refcache::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, config, cli.json).await,
        Commands::Space(args) => commands::space::execute(args, config, cli.json).await,
        Commands::Repo(args) => commands::repo::execute(args, config, cli.json).await,
        Commands::Registry(args) => commands::registry::execute(args, config, cli.json).await,
        Commands::Proxy(args) => commands::proxy::execute(args, config, cli.json).await,
        Commands::Resolve(args) => commands::resolve::execute(args, config, cli.json).await,
        Commands::Watch(args) => commands::watch::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
