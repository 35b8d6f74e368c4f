//! Upstream proxy CLI commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, UpstreamAuthType, UpstreamProxy, UpstreamSource};

#[derive(Args, Debug)]
pub struct ProxyArgs {
    #[command(subcommand)]
    pub command: ProxyCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProxyCommands {
    /// Create or replace the upstream proxy of an upstream registry
    Set {
        /// Registry reference (root-space/name) or ID
        registry: String,
        /// Remote URL
        url: String,
        /// Remote kind (dockerhub, awsecr, mavencentral, npmjs, pypi, crates, custom)
        #[arg(short, long, default_value = "custom")]
        source: String,
        /// Key of the remote repository; defaults to the registry name
        #[arg(long)]
        repo_key: Option<String>,
        /// User name for basic authentication
        #[arg(long)]
        user_name: Option<String>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ProxyOutput {
    pub success: bool,
    pub message: String,
    pub proxy: UpstreamProxy,
}

impl CommandOutput for ProxyOutput {
    fn to_human(&self) -> String {
        format!(
            "{}\n  registry: {}\n  source: {}\n  url: {}",
            self.message, self.proxy.registry_id, self.proxy.source, self.proxy.url
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ProxyArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    let result = match args.command {
        ProxyCommands::Set {
            registry,
            url,
            source,
            repo_key,
            user_name,
        } => {
            let source: UpstreamSource = source.parse()?;
            let registry = ctx.service.registries.find_by_ref(&registry).await?;
            if !registry.is_upstream() {
                bail!("Registry '{}' is not an upstream registry", registry.name);
            }

            let mut proxy = UpstreamProxy::new(
                registry.id,
                repo_key.unwrap_or_else(|| registry.name.clone()),
                source,
                url,
            );
            if user_name.is_some() {
                proxy.auth_type = UpstreamAuthType::UserPassword;
                proxy.user_name = user_name;
            }

            let saved = ctx.stores.upstream_proxies.upsert(&proxy).await?;
            ctx.service.upstream_proxies.mark_changed(&saved).await;

            ProxyOutput {
                success: true,
                message: format!("Upstream proxy set for registry {}", registry.name),
                proxy: saved,
            }
        }
    };

    output(&result, json_mode);
    Ok(())
}
