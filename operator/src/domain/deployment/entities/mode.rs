use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum DeploymentMode {
    /// A single server, no replication.
    Single,
    /// Two single servers kept in sync by an agency.
    ResilientSingle,
    /// Full cluster: agents, dbservers and coordinators.
    #[default]
    Cluster,
}

impl DeploymentMode {
    pub fn has_single_servers(&self) -> bool {
        matches!(self, DeploymentMode::Single | DeploymentMode::ResilientSingle)
    }

    pub fn has_agents(&self) -> bool {
        matches!(self, DeploymentMode::ResilientSingle | DeploymentMode::Cluster)
    }

    pub fn has_dbservers(&self) -> bool {
        matches!(self, DeploymentMode::Cluster)
    }

    pub fn has_coordinators(&self) -> bool {
        matches!(self, DeploymentMode::Cluster)
    }

    pub fn supports_sync(&self) -> bool {
        matches!(self, DeploymentMode::Cluster)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Single => write!(f, "Single"),
            DeploymentMode::ResilientSingle => write!(f, "ResilientSingle"),
            DeploymentMode::Cluster => write!(f, "Cluster"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum StorageEngine {
    #[serde(rename = "MMFiles")]
    MMFiles,
    #[default]
    #[serde(rename = "RocksDB")]
    RocksDB,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum PullPolicy {
    Always,
    Never,
    #[default]
    IfNotPresent,
}
