//! Options accepted by the lifecycle operations

use super::DatabaseKind;
use std::path::PathBuf;

/// Settings for creating a new stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    pub services_base_port: u16,
    pub firefly_base_port: u16,
    pub database: DatabaseKind,
    pub blockchain_provider: String,
    pub token_providers: Vec<String>,
    /// The first `external_processes` members run their core outside compose
    pub external_processes: usize,
    /// Defaults to `org_<id>` when empty or short
    pub org_names: Vec<String>,
    /// Defaults to `node_<id>` when empty or short
    pub node_names: Vec<String>,
    pub prometheus_enabled: bool,
    pub prometheus_port: u16,
    pub contract_address: Option<String>,
    pub chain_id: u64,
    pub remote_node_url: Option<String>,
    pub manifest_path: Option<PathBuf>,
    pub release_version: String,
    pub extra_core_config: Option<PathBuf>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            services_base_port: 5100,
            firefly_base_port: 5000,
            database: DatabaseKind::Sqlite3,
            blockchain_provider: "geth".to_string(),
            token_providers: vec!["erc1155".to_string()],
            external_processes: 0,
            org_names: vec![],
            node_names: vec![],
            prometheus_enabled: false,
            prometheus_port: 9090,
            contract_address: None,
            chain_id: 2021,
            remote_node_url: None,
            manifest_path: None,
            release_version: "latest".to_string(),
            extra_core_config: None,
        }
    }
}

impl InitOptions {
    pub fn org_name(&self, index: usize) -> String {
        self.org_names
            .get(index)
            .filter(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("org_{index}"))
    }

    pub fn node_name(&self, index: usize) -> String {
        self.node_names
            .get(index)
            .filter(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("node_{index}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Keep `runtime/` and containers when first-time setup fails
    pub no_rollback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOptions {
    pub retries: u32,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self { retries: 3 }
    }
}
