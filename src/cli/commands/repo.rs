//! Repository CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::{now_millis, AppContext};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Repository, RepositoryCore};
use crate::domain::paths;

#[derive(Args, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommands,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommands {
    /// Create a repository inside an existing space
    Create {
        /// Space path or ID
        space: String,
        /// Repository identifier
        identifier: String,
        /// Default branch name
        #[arg(short = 'b', long, default_value = "main")]
        default_branch: String,
        /// Make the repository public
        #[arg(long)]
        public: bool,
    },
    /// Soft-delete a repository
    Delete {
        /// Repository path (space/identifier) or ID
        repo: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct RepoOutput {
    pub id: i64,
    pub parent_id: i64,
    pub path: String,
    pub default_branch: String,
    pub is_public: bool,
    pub deleted: Option<i64>,
}

impl RepoOutput {
    fn from_core(repo: &RepositoryCore, deleted: Option<i64>) -> Self {
        Self {
            id: repo.id,
            parent_id: repo.parent_id,
            path: repo.path.clone(),
            default_branch: repo.default_branch.clone(),
            is_public: repo.is_public,
            deleted,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RepoActionOutput {
    pub success: bool,
    pub message: String,
    pub repo: RepoOutput,
}

impl CommandOutput for RepoActionOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            self.message.clone(),
            format!("  id: {}", self.repo.id),
            format!("  path: {}", self.repo.path),
        ];
        if let Some(deleted) = self.repo.deleted {
            lines.push(format!("  deleted at: {deleted}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RepoArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    let result = match args.command {
        RepoCommands::Create {
            space,
            identifier,
            default_branch,
            public,
        } => {
            paths::validate_identifier(&identifier)?;
            let space = ctx.service.spaces.find_by_ref(&space).await?;

            let mut repo = Repository::new(space.id, &space.path, identifier);
            repo.default_branch = default_branch;
            repo.is_public = public;
            let created = ctx.stores.repos.create(&repo).await?;

            RepoActionOutput {
                success: true,
                message: format!("Repository created: {}", created.path),
                repo: RepoOutput::from_core(&created.core(), None),
            }
        }
        RepoCommands::Delete { repo } => {
            let existing = ctx.service.repos.find_by_ref(&repo).await?;
            let deleted_at = now_millis();
            ctx.stores.repos.soft_delete(existing.id, deleted_at).await?;
            ctx.service.repos.mark_changed(&existing).await;

            RepoActionOutput {
                success: true,
                message: format!("Repository deleted: {}", existing.path),
                repo: RepoOutput::from_core(&existing, Some(deleted_at)),
            }
        }
    };

    output(&result, json_mode);
    Ok(())
}
