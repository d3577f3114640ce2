//! go-ethereum dev chain with clique sealing

use super::genesis::GethGenesis;
use super::rpc::{RpcClient, unlock_accounts};
use super::{GETH_IMAGE, KEY_PASSWORD, ethconnect};
use crate::blockchain::{BlockchainProvider, ContractDeploymentResult};
use crate::context::ProviderContext;
use crate::error::Result;
use async_trait::async_trait;
use ledgerflow_container::{DependsOn, RunSpec, Service, ServiceDefinition};
use ledgerflow_core::{
    BlockchainConfig, BlockchainKind, DeployedContract, InitOptions, Member, OrgConfig,
};
use std::path::Path;

const SERVICE: &str = "geth";

pub struct GethProvider {
    ctx: ProviderContext,
}

impl GethProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn command(&self) -> String {
        format!(
            "--datadir /data --syncmode 'full' --port 30311 --http --http.addr \"0.0.0.0\" \
             --http.port 8545 --http.vhosts \"*\" --http.api 'admin,personal,eth,net,web3,txpool,miner,clique' \
             --networkid {} --miner.gasprice 0 --password /data/password --mine \
             --allow-insecure-unlock --nodiscover",
            self.ctx.stack.chain_id
        )
    }

    fn addresses(&self) -> Vec<String> {
        self.ctx.stack.members.iter().map(|m| m.address.clone()).collect()
    }
}

#[async_trait]
impl BlockchainProvider for GethProvider {
    fn kind(&self) -> BlockchainKind {
        BlockchainKind::Geth
    }

    async fn write_config(&self, _options: &InitOptions) -> Result<()> {
        let stack = &self.ctx.stack;
        let layout = &self.ctx.layout;

        super::write_keyfiles(stack, layout)?;
        super::write_password(layout)?;
        ethconnect::write_configs(stack, layout, SERVICE)?;

        let genesis = GethGenesis::new(stack.chain_id, &self.addresses());
        std::fs::write(
            layout.init_blockchain_dir().join("genesis.json"),
            serde_json::to_string_pretty(&genesis)?,
        )?;
        Ok(())
    }

    async fn first_time_setup(&self) -> Result<()> {
        let ctx = &self.ctx;
        ethconnect::copy_configs(ctx).await?;

        let volume = ctx.volume(SERVICE);
        ctx.runtime.create_volume(&volume).await?;
        super::import_keys(ctx, &volume).await?;

        let genesis = ctx.layout.runtime_blockchain_dir().join("genesis.json");
        ctx.runtime
            .copy_to_volume(&volume, &genesis, "genesis.json")
            .await?;

        tracing::info!("Initializing genesis block");
        let init = RunSpec::ephemeral(GETH_IMAGE)
            .volume(volume, "/data")
            .args(["--datadir", "/data", "init", "/data/genesis.json"]);
        ctx.runtime.run(&init).await?;
        Ok(())
    }

    async fn post_start(&self, _first_time_setup: bool) -> Result<()> {
        let ctx = &self.ctx;
        let url = format!("http://127.0.0.1:{}", ctx.stack.exposed_blockchain_port);
        let client = RpcClient::new(ctx.http.clone(), url);
        let accounts: Vec<(String, String)> = ctx
            .stack
            .members
            .iter()
            .map(|m| (m.id.clone(), m.address.clone()))
            .collect();
        unlock_accounts(
            &client,
            &accounts,
            KEY_PASSWORD,
            ctx.timing.unlock_retries,
            ctx.timing.retry_period,
        )
        .await
    }

    async fn deploy_firefly_contract(&self) -> Result<ContractDeploymentResult> {
        super::deploy_firefly_contract(&self.ctx).await
    }

    fn service_definitions(&self) -> Vec<ServiceDefinition> {
        let stack = &self.ctx.stack;
        let geth = Service::new(GETH_IMAGE)
            .container_name(stack.container_name(SERVICE))
            .command(self.command())
            .volume("geth:/data")
            .port(stack.exposed_blockchain_port, 8545);

        let mut definitions = vec![ServiceDefinition {
            service_name: SERVICE.to_string(),
            service: geth,
            volume_names: vec![SERVICE.to_string()],
        }];
        definitions.extend(ethconnect::service_definitions(
            stack,
            &[(SERVICE, DependsOn::started())],
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
