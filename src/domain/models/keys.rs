//! Composite keys of the reference caches. Identifiers are case-insensitive
//! in the store, so keys carry the lower-cased identifier.

use serde::{Deserialize, Serialize};

/// Key of the repository ref-cache: a repository identifier inside a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCacheKey {
    pub space_id: i64,
    pub identifier: String,
}

impl RepoCacheKey {
    pub fn new(space_id: i64, identifier: &str) -> Self {
        Self {
            space_id,
            identifier: identifier.to_lowercase(),
        }
    }
}

/// Key of the registry ref-cache: a registry name under a root space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryRootRefCacheKey {
    pub root_parent_id: i64,
    pub identifier: String,
}

impl RegistryRootRefCacheKey {
    pub fn new(root_parent_id: i64, identifier: &str) -> Self {
        Self {
            root_parent_id,
            identifier: identifier.to_lowercase(),
        }
    }
}
