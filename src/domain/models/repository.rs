use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Entity;
use crate::domain::paths;

/// Lifecycle state of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryState {
    #[default]
    Active,
    Importing,
    Archived,
}

impl fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RepositoryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Importing => "importing",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for RepositoryState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "importing" => Ok(Self::Importing),
            "archived" => Ok(Self::Archived),
            _ => Err(anyhow::anyhow!("Invalid repository state: {s}")),
        }
    }
}

/// Read-only projection of a repository.
///
/// `path` embeds the paths of all ancestor spaces, which is why any space
/// change invalidates every cached repository core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCore {
    pub id: i64,
    pub parent_id: i64,
    pub path: String,
    pub identifier: String,
    pub default_branch: String,
    pub is_public: bool,
    pub state: RepositoryState,
    pub fork_id: Option<i64>,
}

impl Entity for RepositoryCore {
    const KIND: &'static str = "repo";

    fn cache_id(&self) -> i64 {
        self.id
    }
}

/// Full repository row as owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub parent_id: i64,
    pub path: String,
    pub identifier: String,
    pub description: String,
    pub default_branch: String,
    pub is_public: bool,
    pub state: RepositoryState,
    pub fork_id: Option<i64>,
    pub size_bytes: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Soft-delete timestamp in unix milliseconds.
    pub deleted: Option<i64>,
}

impl Repository {
    /// Build a new, not yet persisted repository inside `space_path`.
    pub fn new(parent_id: i64, space_path: &str, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let now = Utc::now();
        Self {
            id: 0,
            parent_id,
            path: paths::concat(space_path, &identifier),
            identifier,
            description: String::new(),
            default_branch: "main".to_string(),
            is_public: false,
            state: RepositoryState::Active,
            fork_id: None,
            size_bytes: 0,
            created: now,
            updated: now,
            deleted: None,
        }
    }

    pub fn core(&self) -> RepositoryCore {
        RepositoryCore {
            id: self.id,
            parent_id: self.parent_id,
            path: self.path.clone(),
            identifier: self.identifier.clone(),
            default_branch: self.default_branch.clone(),
            is_public: self.is_public,
            state: self.state,
            fork_id: self.fork_id,
        }
    }
}
