//! EVM backends: geth, besu and remote-rpc
//!
//! All three put one ethconnect connector in front of each member and share
//! key handling, the core config fragment and contract deployment.

pub mod besu;
pub mod contracts;
pub mod ethconnect;
pub mod genesis;
pub mod geth;
pub mod remote_rpc;
pub mod rpc;
pub mod signer;

pub use besu::BesuProvider;
pub use geth::GethProvider;
pub use remote_rpc::RemoteRpcProvider;

use crate::blockchain::ContractDeploymentResult;
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use contracts::{CombinedJson, CompiledContract};
use ethconnect::EthconnectClient;
use ledgerflow_container::RunSpec;
use ledgerflow_core::{
    BlockchainConfig, DeployedContract, EthconnectConfig, EthereumConfig, Member, OrgConfig, Stack,
    StackLayout,
};
use std::path::Path;

pub const GETH_IMAGE: &str = "ethereum/client-go:release-1.10";
pub const KEY_PASSWORD: &str = "correcthorsebatterystaple";
const PASSWORD_FILE: &str = "password";
const KEYFILE: &str = "keyfile";

/// `init/blockchain/<id>/keyfile` with the raw hex private key of each member
pub fn write_keyfiles(stack: &Stack, layout: &StackLayout) -> Result<()> {
    let dir = layout.init_blockchain_dir();
    for member in &stack.members {
        let key = member
            .private_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingPrivateKey(member.id.clone()))?;
        let member_dir = dir.join(&member.id);
        std::fs::create_dir_all(&member_dir)?;
        std::fs::write(member_dir.join(KEYFILE), key.trim_start_matches("0x"))?;
    }
    Ok(())
}

/// Raw hex key from `init/blockchain/<id>/keyfile`
pub fn read_keyfile(layout: &StackLayout, member: &Member) -> Result<Option<String>> {
    let path = layout.init_blockchain_dir().join(&member.id).join(KEYFILE);
    match std::fs::read_to_string(path) {
        Ok(key) => Ok(Some(key.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Keystore password shared by every imported key
pub fn write_password(layout: &StackLayout) -> Result<()> {
    let dir = layout.init_blockchain_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(PASSWORD_FILE), KEY_PASSWORD)?;
    Ok(())
}

/// Import every member key into `<volume>/keystore` and place the password
/// next to it as `/data/password`
pub async fn import_keys(ctx: &ProviderContext, volume: &str) -> Result<()> {
    let blockchain_dir = ctx.layout.runtime_blockchain_dir();
    let mount = blockchain_dir.to_string_lossy().to_string();
    for member in &ctx.stack.members {
        tracing::info!("Importing key for member {}", member.id);
        let spec = RunSpec::ephemeral(GETH_IMAGE)
            .volume(mount.clone(), "/geth")
            .volume(volume, "/data")
            .args(["account", "import", "--password", "/geth/password"])
            .args(["--keystore", "/data/keystore"])
            .arg(format!("/geth/{}/{}", member.id, KEYFILE));
        ctx.runtime.run(&spec).await?;
    }
    ctx.runtime
        .copy_to_volume(volume, &blockchain_dir.join(PASSWORD_FILE), PASSWORD_FILE)
        .await?;
    Ok(())
}

/// Blockchain and org fragments of a member's core config
pub fn firefly_config(stack: &Stack, member: &Member) -> (BlockchainConfig, OrgConfig) {
    let instance = match stack.contract_address.as_deref() {
        Some(address) if !address.is_empty() => format!("/instances/{address}"),
        _ => "/contracts/firefly".to_string(),
    };
    let blockchain = BlockchainConfig {
        kind: "ethereum".to_string(),
        ethereum: Some(EthereumConfig {
            ethconnect: Some(EthconnectConfig {
                url: ethconnect::member_url(member),
                instance,
                topic: member.id.clone(),
                ..Default::default()
            }),
        }),
        fabric: None,
    };
    let org = OrgConfig {
        name: member.org_name.clone(),
        key: member.address.clone(),
    };
    (blockchain, org)
}

/// Core config patch pointing every node at the deployed instance
pub fn instance_patch(address: &str) -> Result<serde_yaml::Value> {
    let patch = serde_json::json!({
        "blockchain": {
            "ethereum": {
                "ethconnect": { "instance": format!("/instances/{address}") }
            }
        }
    });
    Ok(serde_yaml::to_value(patch)?)
}

/// Deploy the multiparty contract shipped in the core image
pub async fn deploy_firefly_contract(ctx: &ProviderContext) -> Result<ContractDeploymentResult> {
    let source = ctx
        .first_managed_member()
        .ok_or(ProviderError::NoContractSource("firefly core"))?;
    let container = ctx.container(&source.core_service());
    let dir =
        ethconnect::extract_contracts(ctx, &container, "/firefly/contracts", "firefly").await?;
    let contract = CompiledContract::read(&dir.join("Firefly.json"))?;

    let address =
        ethconnect::deploy_to_members(ctx, &contract, &serde_json::json!({}), "firefly").await?;
    Ok(ContractDeploymentResult {
        message: format!("Deployed FireFly contract at {address}"),
        deployed: DeployedContract::at_address("FireFly", address.clone()),
        config_patch: Some(instance_patch(&address)?),
    })
}

pub fn contract_names(file: &Path) -> Result<Vec<String>> {
    Ok(CombinedJson::read(file)?.names())
}

/// Publish and deploy one contract of a combined JSON file through `member`'s connector
pub async fn deploy_custom_contract(
    ctx: &ProviderContext,
    file: &Path,
    contract_name: &str,
    member: &Member,
    constructor_args: &[String],
) -> Result<DeployedContract> {
    let contract = CombinedJson::read(file)?.get(contract_name, file)?;
    let params = contract.constructor_params(contract_name, constructor_args)?;
    let client = EthconnectClient::new(ctx.http.clone(), ethconnect::host_url(member));
    let abi_id = client.publish_abi(&contract).await?;
    let address = client
        .deploy_contract(&abi_id, &member.address, &params, None)
        .await?;
    Ok(DeployedContract::at_address(contract_name, address))
}
