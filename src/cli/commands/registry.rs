//! Registry CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, PackageType, Registry, RegistryType};
use crate::domain::paths;

#[derive(Args, Debug)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommands,
}

#[derive(Subcommand, Debug)]
pub enum RegistryCommands {
    /// Create a registry owned by a space
    Create {
        /// Owning space path or ID
        space: String,
        /// Registry name, unique within the root space
        name: String,
        /// Package type (docker, helm, maven, npm, python, ...)
        #[arg(short, long, default_value = "docker")]
        package_type: String,
        /// Proxy an upstream instead of hosting artifacts
        #[arg(long)]
        upstream: bool,
        /// Optional description
        #[arg(short, long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct RegistryOutput {
    pub id: i64,
    pub name: String,
    pub root_parent_id: i64,
    pub parent_id: i64,
    pub package_type: PackageType,
    pub registry_type: RegistryType,
}

impl From<&Registry> for RegistryOutput {
    fn from(registry: &Registry) -> Self {
        Self {
            id: registry.id,
            name: registry.name.clone(),
            root_parent_id: registry.root_parent_id,
            parent_id: registry.parent_id,
            package_type: registry.package_type,
            registry_type: registry.registry_type,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RegistryActionOutput {
    pub success: bool,
    pub message: String,
    pub registry: RegistryOutput,
}

impl CommandOutput for RegistryActionOutput {
    fn to_human(&self) -> String {
        format!(
            "{}\n  id: {}\n  type: {} {}",
            self.message, self.registry.id, self.registry.package_type, self.registry.registry_type
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RegistryArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    let result = match args.command {
        RegistryCommands::Create {
            space,
            name,
            package_type,
            upstream,
            description,
        } => {
            paths::validate_identifier(&name)?;
            let package_type: PackageType = package_type.parse()?;
            let registry_type = if upstream {
                RegistryType::Upstream
            } else {
                RegistryType::Virtual
            };

            let owner = ctx.service.spaces.find_by_ref(&space).await?;
            let root_id = if owner.is_root() {
                owner.id
            } else {
                let (root, _) = paths::dissect_root(&owner.path)?;
                ctx.service.spaces.find_by_ref(&root).await?.id
            };

            let mut registry = Registry::new(root_id, owner.id, name, package_type, registry_type);
            registry.description = description;
            let created = ctx.stores.registries.create(&registry).await?;

            RegistryActionOutput {
                success: true,
                message: format!("Registry created: {}/{}", owner.path, created.name),
                registry: RegistryOutput::from(&created),
            }
        }
    };

    output(&result, json_mode);
    Ok(())
}
