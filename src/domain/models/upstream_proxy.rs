use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Entity;

/// Kind of remote an upstream registry proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpstreamSource {
    Dockerhub,
    AwsEcr,
    MavenCentral,
    NpmJs,
    PyPi,
    Crates,
    Custom,
}

impl UpstreamSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dockerhub => "Dockerhub",
            Self::AwsEcr => "AwsEcr",
            Self::MavenCentral => "MavenCentral",
            Self::NpmJs => "NpmJs",
            Self::PyPi => "PyPi",
            Self::Crates => "Crates",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpstreamSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dockerhub" => Ok(Self::Dockerhub),
            "awsecr" => Ok(Self::AwsEcr),
            "mavencentral" => Ok(Self::MavenCentral),
            "npmjs" => Ok(Self::NpmJs),
            "pypi" => Ok(Self::PyPi),
            "crates" => Ok(Self::Crates),
            "custom" => Ok(Self::Custom),
            _ => Err(anyhow::anyhow!("Invalid upstream source: {s}")),
        }
    }
}

/// How the proxy authenticates against its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpstreamAuthType {
    #[default]
    Anonymous,
    UserPassword,
    AccessKeySecretKey,
}

impl UpstreamAuthType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "Anonymous",
            Self::UserPassword => "UserPassword",
            Self::AccessKeySecretKey => "AccessKeySecretKey",
        }
    }
}

impl FromStr for UpstreamAuthType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "userpassword" => Ok(Self::UserPassword),
            "accesskeysecretkey" => Ok(Self::AccessKeySecretKey),
            _ => Err(anyhow::anyhow!("Invalid upstream auth type: {s}")),
        }
    }
}

/// Upstream proxy configuration. Exactly one per upstream registry, so it
/// is cached under the owning registry's ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamProxy {
    pub id: i64,
    pub registry_id: i64,
    pub repo_key: String,
    pub source: UpstreamSource,
    pub url: String,
    pub auth_type: UpstreamAuthType,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UpstreamProxy {
    pub fn new(registry_id: i64, repo_key: impl Into<String>, source: UpstreamSource, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            registry_id,
            repo_key: repo_key.into(),
            source,
            url: url.into(),
            auth_type: UpstreamAuthType::Anonymous,
            user_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for UpstreamProxy {
    const KIND: &'static str = "upstream-proxy";

    fn cache_id(&self) -> i64 {
        self.registry_id
    }
}
