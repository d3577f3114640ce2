//! Hyperledger Fabric backend

pub mod fabconnect;
pub mod network;

use crate::blockchain::{BlockchainProvider, ContractDeploymentResult};
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use fabconnect::FabconnectClient;
use ledgerflow_container::{RunSpec, ServiceDefinition};
use ledgerflow_core::{
    BlockchainConfig, BlockchainKind, DeployedContract, FabconnectConfig, FabricConfig,
    InitOptions, Member, OrgConfig,
};
use network::{CHAINCODE, CHANNEL, ORGS, PLATFORM, SHARED_VOLUME, TOOLS_IMAGE};
use serde::Deserialize;
use std::path::Path;

const PACKAGE: &str = "firefly_fabric.tar.gz";
const VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
pub struct QueryInstalledResponse {
    #[serde(default)]
    pub installed_chaincodes: Vec<InstalledChaincode>,
}

#[derive(Debug, Deserialize)]
pub struct InstalledChaincode {
    pub package_id: String,
    pub label: String,
}

pub struct FabricProvider {
    ctx: ProviderContext,
}

impl FabricProvider {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    fn shared_volume(&self) -> String {
        self.ctx.volume(SHARED_VOLUME)
    }

    /// fabric-tools container with the shared crypto volume
    fn tools(&self) -> RunSpec {
        RunSpec::ephemeral(TOOLS_IMAGE)
            .platform(PLATFORM)
            .volume(self.shared_volume(), "/etc/firefly")
    }

    /// fabric-tools attached to the stack network as the org admin
    fn peer_cli(&self) -> RunSpec {
        let org1 = format!("{ORGS}/peerOrganizations/org1.example.com");
        self.tools()
            .network(format!("{}_default", self.ctx.stack_name()))
            .env("CORE_PEER_ADDRESS", "fabric_peer:7051")
            .env("CORE_PEER_TLS_ENABLED", "true")
            .env(
                "CORE_PEER_TLS_ROOTCERT_FILE",
                format!("{org1}/peers/fabric_peer.org1.example.com/tls/ca.crt"),
            )
            .env("CORE_PEER_LOCALMSPID", "Org1MSP")
            .env(
                "CORE_PEER_MSPCONFIGPATH",
                format!("{org1}/users/Admin@org1.example.com/msp"),
            )
    }

    fn orderer_args(channel: &str, chaincode: &str, version: &str) -> Vec<String> {
        [
            "-o",
            "fabric_orderer:7050",
            "--ordererTLSHostnameOverride",
            "fabric_orderer",
            "--channelID",
            channel,
            "--name",
            chaincode,
            "--version",
            version,
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn orderer_tls_args() -> Vec<String> {
        vec![
            "--sequence".to_string(),
            "1".to_string(),
            "--tls".to_string(),
            "--cafile".to_string(),
            format!(
                "{ORGS}/ordererOrganizations/example.com/orderers/fabric_orderer.example.com/msp/tlscacerts/tlsca.example.com-cert.pem"
            ),
        ]
    }

    async fn extract_chaincode(&self) -> Result<()> {
        let ctx = &self.ctx;
        let source = ctx
            .first_managed_member()
            .ok_or(ProviderError::NoContractSource("firefly core"))?;
        let dir = ctx.layout.runtime_contracts_dir();
        std::fs::create_dir_all(&dir)?;

        tracing::info!("Extracting smart contracts");
        ctx.runtime
            .copy_from_container(
                &ctx.container(&source.core_service()),
                &format!("/firefly/contracts/{PACKAGE}"),
                &dir.join(PACKAGE),
            )
            .await?;
        Ok(())
    }

    async fn create_channel(&self) -> Result<()> {
        tracing::info!("Creating channel {}", CHANNEL);
        let admin = format!("{ORGS}/ordererOrganizations/example.com/users/Admin@example.com/tls");
        let spec = self
            .tools()
            .network(format!("{}_default", self.ctx.stack_name()))
            .args(["osnadmin", "channel", "join", "--channelID", CHANNEL])
            .args(["--config-block", "/etc/firefly/firefly.block"])
            .args(["-o", "fabric_orderer:7053"])
            .arg("--ca-file")
            .arg(format!("{admin}/ca.crt"))
            .arg("--client-cert")
            .arg(format!("{admin}/client.crt"))
            .arg("--client-key")
            .arg(format!("{admin}/client.key"));
        self.ctx.runtime.run(&spec).await?;
        Ok(())
    }

    async fn join_channel(&self) -> Result<()> {
        tracing::info!("Joining peer to channel {}", CHANNEL);
        let spec = self
            .peer_cli()
            .args(["peer", "channel", "join", "-b", "/etc/firefly/firefly.block"]);
        self.ctx.runtime.run(&spec).await?;
        Ok(())
    }

    async fn install_chaincode(&self, package: &Path) -> Result<()> {
        tracing::info!("Installing chaincode {}", package.display());
        let spec = self
            .peer_cli()
            .volume(package.to_string_lossy(), "/package.tar.gz")
            .args(["peer", "lifecycle", "chaincode", "install", "/package.tar.gz"]);
        self.ctx.runtime.run(&spec).await?;
        Ok(())
    }

    async fn query_installed(&self) -> Result<QueryInstalledResponse> {
        let spec = self
            .peer_cli()
            .args(["peer", "lifecycle", "chaincode", "queryinstalled", "--output", "json"]);
        let stdout = self.ctx.runtime.run(&spec).await?;
        if stdout.trim().is_empty() {
            return Ok(QueryInstalledResponse {
                installed_chaincodes: vec![],
            });
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn approve_chaincode(
        &self,
        channel: &str,
        chaincode: &str,
        version: &str,
        package_id: &str,
    ) -> Result<()> {
        tracing::info!("Approving chaincode {}", chaincode);
        let spec = self
            .peer_cli()
            .args(["peer", "lifecycle", "chaincode", "approveformyorg"])
            .args(Self::orderer_args(channel, chaincode, version))
            .args(["--package-id", package_id])
            .args(Self::orderer_tls_args());
        self.ctx.runtime.run(&spec).await?;
        Ok(())
    }

    async fn commit_chaincode(&self, channel: &str, chaincode: &str, version: &str) -> Result<()> {
        tracing::info!("Committing chaincode {}", chaincode);
        let spec = self
            .peer_cli()
            .args(["peer", "lifecycle", "chaincode", "commit"])
            .args(Self::orderer_args(channel, chaincode, version))
            .args(Self::orderer_tls_args());
        self.ctx.runtime.run(&spec).await?;
        Ok(())
    }

    /// install → queryinstalled → approve → commit
    async fn deploy_chaincode(
        &self,
        package: &Path,
        channel: &str,
        chaincode: &str,
        version: &str,
        label: Option<&str>,
    ) -> Result<()> {
        self.install_chaincode(package).await?;
        let installed = self.query_installed().await?;
        let package_id = installed
            .installed_chaincodes
            .iter()
            .find(|c| label.is_none_or(|label| c.label == label))
            .map(|c| c.package_id.clone())
            .ok_or(ProviderError::ChaincodeNotInstalled)?;
        self.approve_chaincode(channel, chaincode, version, &package_id)
            .await?;
        self.commit_chaincode(channel, chaincode, version).await
    }
}

#[async_trait]
impl BlockchainProvider for FabricProvider {
    fn kind(&self) -> BlockchainKind {
        BlockchainKind::Fabric
    }

    async fn write_config(&self, _options: &InitOptions) -> Result<()> {
        network::write_config(&self.ctx.stack, &self.ctx.layout)?;
        fabconnect::write_config(&self.ctx.layout)
    }

    async fn first_time_setup(&self) -> Result<()> {
        let ctx = &self.ctx;
        let blockchain_dir = ctx.layout.runtime_blockchain_dir();
        ctx.runtime.create_volume(&self.shared_volume()).await?;

        tracing::info!("Generating crypto material");
        let cryptogen = self
            .tools()
            .volume(
                blockchain_dir.join("cryptogen.yaml").to_string_lossy(),
                "/etc/template.yml",
            )
            .args(["cryptogen", "generate", "--config", "/etc/template.yml"])
            .args(["--output", "/etc/firefly/organizations"]);
        ctx.runtime.run(&cryptogen).await?;

        tracing::info!("Generating genesis block");
        let configtxgen = self
            .tools()
            .volume(
                blockchain_dir.join("configtx.yaml").to_string_lossy(),
                "/etc/hyperledger/fabric/configtx.yaml",
            )
            .args(["configtxgen", "-outputBlock", "/etc/firefly/firefly.block"])
            .args(["-profile", "SingleOrgApplicationGenesis", "-channelID", CHANNEL]);
        ctx.runtime.run(&configtxgen).await?;
        Ok(())
    }

    async fn post_start(&self, _first_time_setup: bool) -> Result<()> {
        Ok(())
    }

    async fn deploy_firefly_contract(&self) -> Result<ContractDeploymentResult> {
        self.extract_chaincode().await?;
        self.create_channel().await?;
        self.join_channel().await?;

        let package = self.ctx.layout.runtime_contracts_dir().join(PACKAGE);
        self.deploy_chaincode(&package, CHANNEL, CHAINCODE, VERSION, None)
            .await?;

        tracing::info!("Registering identities");
        for member in &self.ctx.stack.members {
            let client = FabconnectClient::new(self.ctx.http.clone(), fabconnect::host_url(member));
            client.register_identity(&member.org_name).await?;
        }

        Ok(ContractDeploymentResult {
            message: format!("Deployed FireFly chaincode {CHAINCODE} on channel {CHANNEL}"),
            deployed: DeployedContract::chaincode("FireFly", CHANNEL, CHAINCODE),
            config_patch: None,
        })
    }

    fn service_definitions(&self) -> Vec<ServiceDefinition> {
        let mut definitions = network::service_definitions(&self.ctx.stack);
        definitions.extend(fabconnect::service_definitions(
            &self.ctx.stack,
            &self.ctx.layout,
        ));
        definitions
    }

    fn firefly_config(&self, member: &Member) -> (BlockchainConfig, OrgConfig) {
        let blockchain = BlockchainConfig {
            kind: "fabric".to_string(),
            ethereum: None,
            fabric: Some(FabricConfig {
                fabconnect: Some(FabconnectConfig {
                    url: fabconnect::member_url(member),
                    chaincode: CHAINCODE.to_string(),
                    channel: CHANNEL.to_string(),
                    signer: member.org_name.clone(),
                    topic: member.id.clone(),
                }),
            }),
        };
        let org = OrgConfig {
            name: member.org_name.clone(),
            key: member.org_name.clone(),
        };
        (blockchain, org)
    }

    fn contracts(&self, file: &Path) -> Result<Vec<String>> {
        Ok(vec![file.display().to_string()])
    }

    async fn deploy_contract(
        &self,
        file: &Path,
        _contract_name: &str,
        _member: &Member,
        extra_args: &[String],
    ) -> Result<DeployedContract> {
        let [channel, chaincode, version] = match extra_args {
            [] => return Err(ProviderError::MissingDeployArg("channel")),
            [_] => return Err(ProviderError::MissingDeployArg("chaincode")),
            [_, _] => return Err(ProviderError::MissingDeployArg("version")),
            [channel, chaincode, version, ..] => [channel, chaincode, version],
        };
        let package = std::path::absolute(file)?;
        self.deploy_chaincode(&package, channel, chaincode, version, Some(chaincode.as_str()))
            .await?;
        Ok(DeployedContract::chaincode(chaincode.clone(), channel.clone(), chaincode.clone()))
    }
}
