//! Persisted stack record

use super::{DatabaseKind, PortSet, VersionManifest};
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// A named multi-node development environment, stored as `stack.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub name: String,
    pub members: Vec<Member>,
    pub swarm_key: String,
    /// Shared blockchain port, equal to the services base port
    pub exposed_blockchain_port: u16,
    #[serde(default)]
    pub database: DatabaseKind,
    /// Validated when the provider is selected
    pub blockchain_provider: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_providers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_node_url: Option<String>,
    #[serde(default)]
    pub prometheus_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_prometheus_port: Option<u16>,
    #[serde(default)]
    pub version_manifest: VersionManifest,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployed_contracts: Vec<DeployedContract>,
}

fn default_chain_id() -> u64 {
    2021
}

impl Stack {
    /// Check the structural invariants of a loaded or freshly built stack
    pub fn validate(&self) -> Result<()> {
        if self.members.is_empty() {
            return Err(CoreError::NoMembers);
        }

        let mut seen = HashSet::new();
        for (position, member) in self.members.iter().enumerate() {
            if !seen.insert(member.id.as_str()) {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate member id '{}'",
                    member.id
                )));
            }
            if member.index != position {
                return Err(CoreError::InvalidConfig(format!(
                    "member '{}' has index {} but is at position {}",
                    member.id, member.index, position
                )));
            }
        }
        Ok(())
    }

    pub fn member(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    /// Members whose core process is run by the stack
    pub fn managed_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| !m.external)
    }

    /// Volume name as created by compose for this project
    pub fn volume_name(&self, volume: &str) -> String {
        format!("{}_{}", self.name, volume)
    }

    /// Container name for a service of this stack
    pub fn container_name(&self, service: &str) -> String {
        format!("{}_{}", self.name, service)
    }
}

/// One node of the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub index: usize,
    pub address: String,
    /// Only held in memory while the stack is initialized
    #[serde(skip)]
    pub private_key: Option<String>,
    pub org_name: String,
    pub node_name: String,
    #[serde(default)]
    pub external: bool,
    pub ports: PortSet,
}

impl Member {
    pub fn core_service(&self) -> String {
        format!("firefly_core_{}", self.id)
    }

    pub fn core_config_file(&self) -> String {
        format!("firefly_core_{}.yml", self.id)
    }
}

/// A contract deployed by the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    pub name: String,
    /// `address` on Ethereum, `channel` + `chaincode` on Fabric
    pub location: BTreeMap<String, String>,
}

impl DeployedContract {
    pub fn at_address(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: BTreeMap::from([("address".to_string(), address.into())]),
        }
    }

    pub fn chaincode(
        name: impl Into<String>,
        channel: impl Into<String>,
        chaincode: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: BTreeMap::from([
                ("channel".to_string(), channel.into()),
                ("chaincode".to_string(), chaincode.into()),
            ]),
        }
    }

    /// Human readable location
    pub fn describe(&self) -> String {
        self.location
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// On-disk locations of one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackLayout {
    pub stack_dir: PathBuf,
    pub init_dir: PathBuf,
    pub runtime_dir: PathBuf,
    pub stack_file: PathBuf,
}

impl StackLayout {
    pub fn new(stacks_dir: &Path, name: &str) -> Self {
        let stack_dir = stacks_dir.join(name);
        Self {
            init_dir: stack_dir.join("init"),
            runtime_dir: stack_dir.join("runtime"),
            stack_file: stack_dir.join("stack.json"),
            stack_dir,
        }
    }

    pub fn init_config_dir(&self) -> PathBuf {
        self.init_dir.join("config")
    }

    pub fn runtime_config_dir(&self) -> PathBuf {
        self.runtime_dir.join("config")
    }

    pub fn init_blockchain_dir(&self) -> PathBuf {
        self.init_dir.join("blockchain")
    }

    pub fn runtime_blockchain_dir(&self) -> PathBuf {
        self.runtime_dir.join("blockchain")
    }

    pub fn runtime_contracts_dir(&self) -> PathBuf {
        self.runtime_dir.join("contracts")
    }

    pub fn compose_file(dir: &Path) -> PathBuf {
        dir.join("docker-compose.yml")
    }

    /// First start has happened once `runtime/` exists
    pub fn has_run_before(&self) -> bool {
        self.runtime_dir.is_dir()
    }
}
