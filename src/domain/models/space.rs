use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::domain::paths;

/// Read-only projection of a space, shared between callers via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceCore {
    pub id: i64,
    /// `None` for root spaces.
    pub parent_id: Option<i64>,
    /// Full path including the space's own identifier, e.g. `acme/team1`.
    pub path: String,
    pub identifier: String,
}

impl SpaceCore {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Entity for SpaceCore {
    const KIND: &'static str = "space";

    fn cache_id(&self) -> i64 {
        self.id
    }
}

/// Full space row as owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub path: String,
    pub identifier: String,
    pub description: String,
    pub is_public: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Soft-delete timestamp in unix milliseconds.
    pub deleted: Option<i64>,
}

impl Space {
    /// Build a new, not yet persisted space under `parent`.
    pub fn new(parent: Option<&SpaceCore>, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let now = Utc::now();
        Self {
            id: 0,
            parent_id: parent.map(|p| p.id),
            path: paths::concat(parent.map_or("", |p| p.path.as_str()), &identifier),
            identifier,
            description: String::new(),
            is_public: false,
            created: now,
            updated: now,
            deleted: None,
        }
    }

    pub fn core(&self) -> SpaceCore {
        SpaceCore {
            id: self.id,
            parent_id: self.parent_id,
            path: self.path.clone(),
            identifier: self.identifier.clone(),
        }
    }
}
