//! Hyperledger Besu dev chain behind the signer sidecar

use super::genesis::BesuGenesis;
use super::{ethconnect, signer};
use crate::blockchain::{BlockchainProvider, ContractDeploymentResult};
use crate::context::ProviderContext;
use crate::error::Result;
use async_trait::async_trait;
use ledgerflow_container::{DependsOn, Service, ServiceDefinition};
use ledgerflow_core::{
    BlockchainConfig, BlockchainKind, DeployedContract, InitOptions, KeyPair, Member, OrgConfig,
};
use std::path::Path;

pub const IMAGE: &str = "hyperledger/besu:22.4";
const SERVICE: &str = "besu";
const NODE_KEY: &str = "nodeKey";

pub struct BesuProvider {
    ctx: ProviderContext,
}

impl BesuProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BlockchainProvider for BesuProvider {
    fn kind(&self) -> BlockchainKind {
        BlockchainKind::Besu
    }

    async fn write_config(&self, _options: &InitOptions) -> Result<()> {
        let stack = &self.ctx.stack;
        let layout = &self.ctx.layout;

        super::write_keyfiles(stack, layout)?;
        signer::write_config(stack, layout, &format!("http://{SERVICE}:8545"))?;
        ethconnect::write_configs(stack, layout, signer::SERVICE)?;

        // the node seals with its own key, member accounts only hold funds
        let validator = KeyPair::generate();
        let dir = layout.init_blockchain_dir();
        std::fs::write(dir.join(NODE_KEY), format!("0x{}", validator.private_key))?;

        let accounts: Vec<String> = stack.members.iter().map(|m| m.address.clone()).collect();
        let genesis = BesuGenesis::new(stack.chain_id, &validator.address, &accounts);
        std::fs::write(dir.join("genesis.json"), serde_json::to_string_pretty(&genesis)?)?;
        Ok(())
    }

    async fn first_time_setup(&self) -> Result<()> {
        let ctx = &self.ctx;
        let volume = ctx.volume(SERVICE);
        ctx.runtime.create_volume(&volume).await?;

        let dir = ctx.layout.runtime_blockchain_dir();
        for file in ["genesis.json", NODE_KEY] {
            ctx.runtime.copy_to_volume(&volume, &dir.join(file), file).await?;
        }

        signer::first_time_setup(ctx).await?;
        ethconnect::copy_configs(ctx).await
    }

    async fn post_start(&self, _first_time_setup: bool) -> Result<()> {
        Ok(())
    }

    async fn deploy_firefly_contract(&self) -> Result<ContractDeploymentResult> {
        super::deploy_firefly_contract(&self.ctx).await
    }

    fn service_definitions(&self) -> Vec<ServiceDefinition> {
        let stack = &self.ctx.stack;
        let besu = Service::new(IMAGE)
            .container_name(stack.container_name(SERVICE))
            .user("root")
            .command(
                "--genesis-file=/data/genesis.json --data-path=/data/besu \
                 --node-private-key-file=/data/nodeKey --rpc-http-enabled \
                 --rpc-http-api=ETH,NET,CLIQUE,WEB3,TXPOOL --rpc-http-host=0.0.0.0 \
                 --rpc-http-port=8545 --host-allowlist=* --rpc-http-cors-origins=all \
                 --min-gas-price=0 --revert-reason-enabled",
            )
            .volume("besu:/data");

        let mut definitions = vec![
            ServiceDefinition {
                service_name: SERVICE.to_string(),
                service: besu,
                volume_names: vec![SERVICE.to_string()],
            },
            signer::service_definition(stack, Some((SERVICE, DependsOn::started()))),
        ];
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
