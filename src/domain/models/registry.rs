use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Entity;

/// Package format served by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PackageType {
    Docker,
    Helm,
    Generic,
    Maven,
    Npm,
    Python,
    Nuget,
    Rpm,
    Cargo,
    Go,
}

impl PackageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "DOCKER",
            Self::Helm => "HELM",
            Self::Generic => "GENERIC",
            Self::Maven => "MAVEN",
            Self::Npm => "NPM",
            Self::Python => "PYTHON",
            Self::Nuget => "NUGET",
            Self::Rpm => "RPM",
            Self::Cargo => "CARGO",
            Self::Go => "GO",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DOCKER" => Ok(Self::Docker),
            "HELM" => Ok(Self::Helm),
            "GENERIC" => Ok(Self::Generic),
            "MAVEN" => Ok(Self::Maven),
            "NPM" => Ok(Self::Npm),
            "PYTHON" => Ok(Self::Python),
            "NUGET" => Ok(Self::Nuget),
            "RPM" => Ok(Self::Rpm),
            "CARGO" => Ok(Self::Cargo),
            "GO" => Ok(Self::Go),
            _ => Err(anyhow::anyhow!("Invalid package type: {s}")),
        }
    }
}

/// Whether a registry hosts artifacts itself or proxies an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistryType {
    Virtual,
    Upstream,
}

impl RegistryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Virtual => "VIRTUAL",
            Self::Upstream => "UPSTREAM",
        }
    }
}

impl fmt::Display for RegistryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VIRTUAL" => Ok(Self::Virtual),
            "UPSTREAM" => Ok(Self::Upstream),
            _ => Err(anyhow::anyhow!("Invalid registry type: {s}")),
        }
    }
}

/// Artifact registry, scoped to a root space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub id: i64,
    pub name: String,
    /// ID of the root space the registry lives under.
    pub root_parent_id: i64,
    /// ID of the space that directly owns the registry.
    pub parent_id: i64,
    pub description: String,
    pub package_type: PackageType,
    pub registry_type: RegistryType,
    pub allowed_pattern: Vec<String>,
    pub blocked_pattern: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registry {
    pub fn new(
        root_parent_id: i64,
        parent_id: i64,
        name: impl Into<String>,
        package_type: PackageType,
        registry_type: RegistryType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            root_parent_id,
            parent_id,
            description: String::new(),
            package_type,
            registry_type,
            allowed_pattern: Vec::new(),
            blocked_pattern: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_upstream(&self) -> bool {
        self.registry_type == RegistryType::Upstream
    }
}

impl Entity for Registry {
    const KIND: &'static str = "registry";

    fn cache_id(&self) -> i64 {
        self.id
    }
}
