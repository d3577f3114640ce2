//! Blockchain provider contract

use crate::error::Result;
use async_trait::async_trait;
use ledgerflow_container::ServiceDefinition;
use ledgerflow_core::{BlockchainConfig, BlockchainKind, DeployedContract, InitOptions, Member, OrgConfig};
use std::path::Path;

/// Outcome of deploying the core multiparty contract
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDeploymentResult {
    pub message: String,
    pub deployed: DeployedContract,
    /// Merged into every member's core config when present
    pub config_patch: Option<serde_yaml::Value>,
}

/// Lifecycle hooks of one blockchain backend
#[async_trait]
pub trait BlockchainProvider: Send + Sync {
    fn kind(&self) -> BlockchainKind;

    /// Write node, connector and key material under `init/`
    async fn write_config(&self, options: &InitOptions) -> Result<()>;

    /// Seed volumes before the first `compose up`
    async fn first_time_setup(&self) -> Result<()>;

    async fn pre_start(&self) -> Result<()> {
        Ok(())
    }

    async fn post_start(&self, first_time_setup: bool) -> Result<()>;

    async fn deploy_firefly_contract(&self) -> Result<ContractDeploymentResult>;

    fn service_definitions(&self) -> Vec<ServiceDefinition>;

    fn firefly_config(&self, member: &Member) -> (BlockchainConfig, OrgConfig);

    async fn reset(&self) -> Result<()> {
        Ok(())
    }

    /// Private key of `member`'s account as written under `init/`, if the
    /// backend keeps one
    fn account_key(&self, _member: &Member) -> Result<Option<String>> {
        Ok(None)
    }

    /// Contract names a compiled contract file offers for `deploy_contract`
    fn contracts(&self, file: &Path) -> Result<Vec<String>>;

    async fn deploy_contract(
        &self,
        file: &Path,
        contract_name: &str,
        member: &Member,
        extra_args: &[String],
    ) -> Result<DeployedContract>;
}
