//! Signing JSON-RPC proxy holding the member keys
//!
//! Used by besu and remote-rpc, where the node itself holds no accounts.

use crate::context::ProviderContext;
use crate::error::Result;
use ledgerflow_container::{DependsOn, HealthCheck, Service, ServiceDefinition};
use ledgerflow_core::{Stack, StackLayout};
use serde::{Deserialize, Serialize};

pub const IMAGE: &str = "ghcr.io/hyperledger/firefly-signer:v0.9.1";
pub const SERVICE: &str = "ethsigner";
const CONFIG_FILE: &str = "ethsigner.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub file_wallet: FileWalletConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub chain_id: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWalletConfig {
    pub path: String,
    pub filenames: FilenamesConfig,
    pub default_password_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilenamesConfig {
    pub primary_match_regex: String,
}

impl SignerConfig {
    pub fn new(chain_id: u64, rpc_url: &str) -> Self {
        Self {
            server: ServerConfig {
                port: 8545,
                address: "0.0.0.0".to_string(),
            },
            backend: BackendConfig {
                chain_id,
                url: rpc_url.to_string(),
            },
            file_wallet: FileWalletConfig {
                path: "/data/keystore".to_string(),
                // keystore files written by `geth account import`
                filenames: FilenamesConfig {
                    primary_match_regex: "^UTC--.*--([0-9a-f]{40})$".to_string(),
                },
                default_password_file: "/data/password".to_string(),
            },
        }
    }
}

/// Password plus `init/config/ethsigner.yaml` forwarding to `rpc_url`
pub fn write_config(stack: &Stack, layout: &StackLayout, rpc_url: &str) -> Result<()> {
    super::write_password(layout)?;
    let dir = layout.init_config_dir();
    std::fs::create_dir_all(&dir)?;
    let yaml = serde_yaml::to_string(&SignerConfig::new(stack.chain_id, rpc_url))?;
    std::fs::write(dir.join(CONFIG_FILE), yaml)?;
    Ok(())
}

/// Fill the keystore and config volumes
pub async fn first_time_setup(ctx: &ProviderContext) -> Result<()> {
    let data_volume = ctx.volume(SERVICE);
    ctx.runtime.create_volume(&data_volume).await?;
    super::import_keys(ctx, &data_volume).await?;

    let config_volume = ctx.volume("ethsigner_config");
    let config = ctx.layout.runtime_config_dir().join(CONFIG_FILE);
    ctx.runtime
        .copy_to_volume(&config_volume, &config, "firefly.ffsigner")
        .await?;
    Ok(())
}

pub fn service_definition(stack: &Stack, depends_on: Option<(&str, DependsOn)>) -> ServiceDefinition {
    let mut service = Service::new(IMAGE)
        .container_name(stack.container_name(SERVICE))
        .user("root")
        .port(stack.exposed_blockchain_port, 8545)
        .volume("ethsigner:/data")
        .volume("ethsigner_config:/etc/firefly")
        .healthcheck(
            HealthCheck::new([
                "CMD",
                "curl",
                "-X",
                "POST",
                "-H",
                "Content-Type: application/json",
                "-d",
                r#"{"jsonrpc":"2.0","method":"net_version","params":[],"id":"1"}"#,
                "-w",
                "%{http_code}",
                "-sS",
                "--fail",
                "http://localhost:8545/",
            ])
            .interval("15s")
            .retries(60),
        );
    if let Some((dependency, condition)) = depends_on {
        service = service.depends_on(dependency, condition);
    }

    ServiceDefinition {
        service_name: SERVICE.to_string(),
        service,
        volume_names: vec![SERVICE.to_string(), "ethsigner_config".to_string()],
    }
}
