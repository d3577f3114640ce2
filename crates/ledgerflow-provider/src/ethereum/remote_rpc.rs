//! External JSON-RPC endpoint fronted by the signer sidecar

use super::{ethconnect, signer};
use crate::blockchain::{BlockchainProvider, ContractDeploymentResult};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use ledgerflow_container::{DependsOn, ServiceDefinition};
use ledgerflow_core::{
    BlockchainConfig, BlockchainKind, DeployedContract, InitOptions, Member, OrgConfig,
};
use std::path::Path;

pub struct RemoteRpcProvider {
    ctx: ProviderContext,
}

impl RemoteRpcProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BlockchainProvider for RemoteRpcProvider {
    fn kind(&self) -> BlockchainKind {
        BlockchainKind::RemoteRpc
    }

    async fn write_config(&self, options: &InitOptions) -> Result<()> {
        let stack = &self.ctx.stack;
        let layout = &self.ctx.layout;
        let url = stack
            .remote_node_url
            .as_deref()
            .or(options.remote_node_url.as_deref())
            .filter(|url| !url.is_empty())
            .ok_or(ProviderError::MissingRemoteUrl)?;

        super::write_keyfiles(stack, layout)?;
        signer::write_config(stack, layout, url)?;
        ethconnect::write_configs(stack, layout, signer::SERVICE)
    }

    async fn first_time_setup(&self) -> Result<()> {
        signer::first_time_setup(&self.ctx).await?;
        ethconnect::copy_configs(&self.ctx).await
    }

    async fn post_start(&self, _first_time_setup: bool) -> Result<()> {
        Ok(())
    }

    async fn deploy_firefly_contract(&self) -> Result<ContractDeploymentResult> {
        Err(ProviderError::PredeployRequired)
    }

    fn service_definitions(&self) -> Vec<ServiceDefinition> {
        let stack = &self.ctx.stack;
        let mut definitions = vec![signer::service_definition(stack, None)];
        definitions.extend(ethconnect::service_definitions(
            stack,
            &[(signer::SERVICE, DependsOn::healthy())],
        ));
        definitions
    }

    fn firefly_config(&self, member: &Member) -> (BlockchainConfig, OrgConfig) {
        super::firefly_config(&self.ctx.stack, member)
    }

    fn account_key(&self, member: &Member) -> Result<Option<String>> {
        super::read_keyfile(&self.ctx.layout, member)
    }

    fn contracts(&self, file: &Path) -> Result<Vec<String>> {
        super::contract_names(file)
    }

    async fn deploy_contract(
        &self,
        file: &Path,
        contract_name: &str,
        member: &Member,
        extra_args: &[String],
    ) -> Result<DeployedContract> {
        super::deploy_custom_contract(&self.ctx, file, contract_name, member, extra_args).await
    }
}
