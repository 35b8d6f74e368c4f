//! Space CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::{now_millis, AppContext};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Space, SpaceCore};
use crate::domain::paths;

#[derive(Args, Debug)]
pub struct SpaceArgs {
    #[command(subcommand)]
    pub command: SpaceCommands,
}

#[derive(Subcommand, Debug)]
pub enum SpaceCommands {
    /// Create a space; the parent path must already exist
    Create {
        /// Full path of the new space, e.g. acme/team1
        path: String,
        /// Optional description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Change a space's identifier, moving every descendant path
    Rename {
        /// Space path or ID
        space: String,
        /// New identifier of the space's last segment
        identifier: String,
    },
    /// Soft-delete a space
    Delete {
        /// Space path or ID
        space: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct SpaceOutput {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub path: String,
    pub identifier: String,
}

impl From<&SpaceCore> for SpaceOutput {
    fn from(space: &SpaceCore) -> Self {
        Self {
            id: space.id,
            parent_id: space.parent_id,
            path: space.path.clone(),
            identifier: space.identifier.clone(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SpaceActionOutput {
    pub success: bool,
    pub message: String,
    pub space: SpaceOutput,
}

impl CommandOutput for SpaceActionOutput {
    fn to_human(&self) -> String {
        format!("{}\n  id: {}\n  path: {}", self.message, self.space.id, self.space.path)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SpaceArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    let result = match args.command {
        SpaceCommands::Create { path, description } => {
            paths::validate(&path)?;
            let (parent, identifier) = match paths::dissect_root(&path)? {
                (root, None) => (None, root),
                (_, Some(_)) => {
                    let (parent_path, leaf) = paths::dissect_leaf(&path)?;
                    (Some(ctx.service.spaces.find_by_ref(&parent_path).await?), leaf)
                }
            };
            paths::validate_identifier(&identifier)?;

            let mut space = Space::new(parent.as_deref(), identifier);
            space.description = description;
            let created = ctx.stores.spaces.create(&space).await?;

            SpaceActionOutput {
                success: true,
                message: format!("Space created: {}", created.path),
                space: SpaceOutput::from(&created.core()),
            }
        }
        SpaceCommands::Rename { space, identifier } => {
            paths::validate_identifier(&identifier)?;
            let before = ctx.service.spaces.find_by_ref(&space).await?;
            let renamed = ctx.stores.spaces.rename(before.id, &identifier).await?;
            // Evict with the old path so the stale path entry is dropped.
            ctx.service.spaces.mark_changed(&before).await;

            SpaceActionOutput {
                success: true,
                message: format!("Space renamed: {} -> {}", before.path, renamed.path),
                space: SpaceOutput::from(&renamed.core()),
            }
        }
        SpaceCommands::Delete { space } => {
            let existing = ctx.service.spaces.find_by_ref(&space).await?;
            ctx.stores.spaces.soft_delete(existing.id, now_millis()).await?;
            ctx.service.spaces.mark_changed(&existing).await;

            SpaceActionOutput {
                success: true,
                message: format!("Space deleted: {}", existing.path),
                space: SpaceOutput::from(existing.as_ref()),
            }
        }
    };

    output(&result, json_mode);
    Ok(())
}
