//! ethconnect: per-member REST connector in front of the chain

use super::contracts::CompiledContract;
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use ledgerflow_container::{ContainerError, DependsOn, Service, ServiceDefinition};
use ledgerflow_core::{Member, Stack, StackLayout};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub rest: RestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(rename = "rest-gateway")]
    pub rest_gateway: RestGatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestGatewayConfig {
    pub rpc: RpcConfig,
    pub openapi: OpenApiConfig,
    pub http: HttpConfig,
    #[serde(rename = "maxTXWaitTime")]
    pub max_tx_wait_time: u32,
    pub max_in_flight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiConfig {
    pub event_polling_interval_sec: u32,
    pub storage_path: String,
    #[serde(rename = "eventsDB")]
    pub events_db: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,
}

impl ConnectorConfig {
    /// Connector forwarding to `rpc_service` on the compose network
    pub fn new(rpc_service: &str) -> Self {
        Self {
            rest: RestConfig {
                rest_gateway: RestGatewayConfig {
                    rpc: RpcConfig {
                        url: format!("http://{rpc_service}:8545"),
                    },
                    openapi: OpenApiConfig {
                        event_polling_interval_sec: 1,
                        storage_path: "./abis".to_string(),
                        events_db: "./events".to_string(),
                    },
                    http: HttpConfig { port: PORT },
                    max_tx_wait_time: 60,
                    max_in_flight: 10,
                },
            },
        }
    }
}

pub fn service_name(member: &Member) -> String {
    format!("ethconnect_{}", member.id)
}

fn config_file(member: &Member) -> String {
    format!("ethconnect_{}.yaml", member.id)
}

/// Write `init/config/ethconnect_<id>.yaml` for every member
pub fn write_configs(stack: &Stack, layout: &StackLayout, rpc_service: &str) -> Result<()> {
    let dir = layout.init_config_dir();
    std::fs::create_dir_all(&dir)?;
    let yaml = serde_yaml::to_string(&ConnectorConfig::new(rpc_service))?;
    for member in &stack.members {
        std::fs::write(dir.join(config_file(member)), &yaml)?;
    }
    Ok(())
}

/// Seed each member's config volume from `runtime/config`
pub async fn copy_configs(ctx: &ProviderContext) -> Result<()> {
    let dir = ctx.layout.runtime_config_dir();
    for member in &ctx.stack.members {
        let volume = ctx.volume(&format!("ethconnect_config_{}", member.id));
        ctx.runtime
            .copy_to_volume(&volume, &dir.join(config_file(member)), "config.yaml")
            .await?;
    }
    Ok(())
}

/// One connector per member, each depending on `depends_on`
pub fn service_definitions(stack: &Stack, depends_on: &[(&str, DependsOn)]) -> Vec<ServiceDefinition> {
    stack
        .members
        .iter()
        .map(|member| {
            let name = service_name(member);
            let config = format!("ethconnect_config_{}", member.id);
            let abis = format!("ethconnect_abis_{}", member.id);
            let events = format!("ethconnect_events_{}", member.id);

            let mut service = Service::new(stack.version_manifest.ethconnect.image_ref())
                .container_name(stack.container_name(&name))
                .command("server -f ./config/config.yaml -d 2")
                .port(member.ports.connector, PORT)
                .volume(format!("{config}:/ethconnect/config"))
                .volume(format!("{abis}:/ethconnect/abis"))
                .volume(format!("{events}:/ethconnect/events"));
            for (dependency, condition) in depends_on {
                service = service.depends_on(*dependency, condition.clone());
            }

            ServiceDefinition {
                service_name: name,
                service,
                volume_names: vec![config, abis, events],
            }
        })
        .collect()
}

/// Connector URL as seen by the member's core process
pub fn member_url(member: &Member) -> String {
    if member.external {
        host_url(member)
    } else {
        format!("http://{}:{}", service_name(member), PORT)
    }
}

/// Connector URL reachable from the host
pub fn host_url(member: &Member) -> String {
    format!("http://127.0.0.1:{}", member.ports.connector)
}

/// Copy a directory of compiled contracts out of a running container into
/// `runtime/contracts/<name>`
pub async fn extract_contracts(
    ctx: &ProviderContext,
    container: &str,
    source: &str,
    name: &str,
) -> Result<PathBuf> {
    let parent = ctx.layout.runtime_contracts_dir();
    std::fs::create_dir_all(&parent)?;
    let dest = parent.join(name);
    if dest.exists() {
        std::fs::remove_dir_all(&dest)?;
    }
    ctx.runtime.copy_from_container(container, source, &dest).await?;
    Ok(dest)
}

#[derive(Debug, Deserialize)]
struct PublishAbiResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployContractResponse {
    contract_address: String,
}

/// REST client for one connector
#[derive(Debug, Clone)]
pub struct EthconnectClient {
    http: reqwest::Client,
    base_url: String,
}

impl EthconnectClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload ABI and bytecode, returning the ABI id
    pub async fn publish_abi(&self, contract: &CompiledContract) -> Result<String> {
        let url = format!("{}/abis", self.base_url);
        tracing::debug!("POST {}", url);
        let form = reqwest::multipart::Form::new()
            .text("abi", serde_json::to_string(&contract.abi)?)
            .text("bytecode", contract.bytecode.clone());
        let response = self.http.post(&url).multipart(form).send().await?;
        let body: PublishAbiResponse = expect_status(response, &url, StatusCode::OK).await?;
        Ok(body.id)
    }

    /// Deploy an instance of a published ABI, returning its address
    pub async fn deploy_contract(
        &self,
        abi_id: &str,
        from: &str,
        params: &serde_json::Value,
        register_as: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/abis/{}", self.base_url, abi_id);
        tracing::debug!("POST {}", url);
        let mut request = self
            .http
            .post(&url)
            .header("x-firefly-from", from)
            .header("x-firefly-sync", "true")
            .json(params);
        if let Some(name) = register_as {
            request = request.header("x-firefly-register", name);
        }
        let response = request.send().await?;
        let body: DeployContractResponse = expect_status(response, &url, StatusCode::OK).await?;
        Ok(body.contract_address)
    }

    /// Register an already deployed address under a friendly name
    pub async fn register_contract(&self, abi_id: &str, address: &str, name: &str) -> Result<()> {
        let url = format!("{}/abis/{}/{}", self.base_url, abi_id, address);
        tracing::debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-firefly-sync", "true")
            .header("x-firefly-register", name)
            .send()
            .await?;
        let _: serde_json::Value = expect_status(response, &url, StatusCode::CREATED).await?;
        Ok(())
    }
}

async fn expect_status<R: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
    expected: StatusCode,
) -> Result<R> {
    let status = response.status();
    let text = response.text().await?;
    if status != expected {
        return Err(ContainerError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        }
        .into());
    }
    if text.trim().is_empty() {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    serde_json::from_str(&text).map_err(|e| ProviderError::UnexpectedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Publish `contract` on every member's connector. The first member deploys
/// it under `register_as`, the others register the resulting address.
pub async fn deploy_to_members(
    ctx: &ProviderContext,
    contract: &CompiledContract,
    params: &serde_json::Value,
    register_as: &str,
) -> Result<String> {
    let mut address: Option<String> = None;
    for member in &ctx.stack.members {
        let client = EthconnectClient::new(ctx.http.clone(), host_url(member));
        let abi_id = client.publish_abi(contract).await?;
        match &address {
            None => {
                tracing::info!("Deploying {} from member {}", register_as, member.id);
                let deployed = client
                    .deploy_contract(&abi_id, &member.address, params, Some(register_as))
                    .await?;
                address = Some(deployed);
            }
            Some(existing) => {
                tracing::info!("Registering {} on member {}", register_as, member.id);
                client.register_contract(&abi_id, existing, register_as).await?;
            }
        }
    }
    address.ok_or(ProviderError::Core(ledgerflow_core::CoreError::NoMembers))
}
