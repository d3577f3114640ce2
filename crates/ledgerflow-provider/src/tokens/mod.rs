//! Token connector runtimes
//!
//! Each token provider adds one connector container per member, deployed
//! alongside that member's ethconnect. `index` is the provider's position in
//! the stack's token list and selects the member's token port.

pub mod erc1155;
pub mod erc20_erc721;

use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::ethereum::contracts::CompiledContract;
use crate::ethereum::ethconnect;
use async_trait::async_trait;
use ledgerflow_container::{DependsOn, Service, ServiceDefinition, http_json_with_retry};
use ledgerflow_core::{
    DeployedContract, ManifestEntry, Member, TokenConnectorConfig, TokenKind, VersionManifest,
};
use reqwest::Method;

pub const PORT: u16 = 3000;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    fn kind(&self) -> TokenKind;

    fn service_definitions(&self, index: usize) -> Vec<ServiceDefinition>;

    fn firefly_config(&self, member: &Member, index: usize) -> TokenConnectorConfig;

    async fn deploy_smart_contracts(&self, index: usize) -> Result<Vec<DeployedContract>>;

    async fn first_time_setup(&self, index: usize) -> Result<()>;
}

/// What differs between token connector flavours
#[derive(Debug, Clone, Copy)]
pub struct TokenFlavor {
    pub kind: TokenKind,
    /// ethconnect path the connector talks to
    pub instance: &'static str,
    /// Compiled artifact inside the connector image
    pub artifact: &'static str,
    pub contract_name: &'static str,
    pub register_as: &'static str,
    pub image: fn(&VersionManifest) -> &ManifestEntry,
    pub constructor_params: fn() -> serde_json::Value,
}

/// Shared implementation parameterised by [`TokenFlavor`]
#[derive(Debug, Clone)]
pub struct TokenConnector {
    ctx: ProviderContext,
    flavor: TokenFlavor,
}

pub fn service_name(member: &Member, index: usize) -> String {
    format!("tokens_{}_{}", member.id, index)
}

impl TokenConnector {
    pub fn new(ctx: ProviderContext, flavor: TokenFlavor) -> Self {
        Self { ctx, flavor }
    }

    fn url(member: &Member, index: usize) -> String {
        if member.external {
            Self::host_url(member, index)
        } else {
            format!("http://{}:{}", service_name(member, index), PORT)
        }
    }

    fn host_url(member: &Member, index: usize) -> String {
        let port = member.ports.tokens.get(index).copied().unwrap_or_default();
        format!("http://127.0.0.1:{port}")
    }
}

#[async_trait]
impl TokenProvider for TokenConnector {
    fn kind(&self) -> TokenKind {
        self.flavor.kind
    }

    fn service_definitions(&self, index: usize) -> Vec<ServiceDefinition> {
        let stack = &self.ctx.stack;
        let image = (self.flavor.image)(&stack.version_manifest).image_ref();
        stack
            .members
            .iter()
            .map(|member| {
                let name = service_name(member, index);
                let connector = ethconnect::service_name(member);
                let mut service = Service::new(image.clone())
                    .container_name(stack.container_name(&name))
                    .env("ETHCONNECT_URL", ethconnect::member_url(member))
                    .env("ETHCONNECT_INSTANCE", self.flavor.instance)
                    .env("ETHCONNECT_TOPIC", name.clone())
                    .env("AUTO_INIT", "false")
                    .depends_on(connector, DependsOn::started());
                if let Some(port) = member.ports.tokens.get(index) {
                    service = service.port(*port, PORT);
                }
                ServiceDefinition {
                    service_name: name,
                    service,
                    volume_names: vec![],
                }
            })
            .collect()
    }

    fn firefly_config(&self, member: &Member, index: usize) -> TokenConnectorConfig {
        TokenConnectorConfig {
            plugin: "fftokens".to_string(),
            name: self.flavor.kind.as_str().to_string(),
            url: Self::url(member, index),
        }
    }

    async fn deploy_smart_contracts(&self, index: usize) -> Result<Vec<DeployedContract>> {
        let ctx = &self.ctx;
        let source = ctx
            .first_managed_member()
            .ok_or(ProviderError::NoContractSource("tokens connector"))?;
        let container = ctx.container(&service_name(source, index));
        let dir = ethconnect::extract_contracts(
            ctx,
            &container,
            "/root/contracts",
            &format!("tokens_{index}"),
        )
        .await?;
        let contract = CompiledContract::read(&dir.join(self.flavor.artifact))?;

        let address = ethconnect::deploy_to_members(
            ctx,
            &contract,
            &(self.flavor.constructor_params)(),
            self.flavor.register_as,
        )
        .await?;
        tracing::info!("Deployed {} at {}", self.flavor.contract_name, address);
        Ok(vec![DeployedContract::at_address(
            self.flavor.contract_name,
            address,
        )])
    }

    async fn first_time_setup(&self, index: usize) -> Result<()> {
        let ctx = &self.ctx;
        for member in &ctx.stack.members {
            let url = format!("{}/api/v1/init", Self::host_url(member, index));
            tracing::info!("Initializing {} connector for member {}", self.flavor.kind, member.id);
            let _: serde_json::Value = http_json_with_retry(
                &ctx.http,
                Method::POST,
                &url,
                Some(&serde_json::json!({})),
                ctx.timing.http_retries,
                ctx.timing.retry_period,
            )
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn connector(members: usize) -> TokenConnector {
        let (_dir, layout) = testing::layout();
        let (ctx, _) = testing::context(testing::stack("geth", members), layout);
        TokenConnector::new(ctx, erc1155::FLAVOR)
    }

    #[test]
    fn test_connector_per_member() {
        let definitions = connector(2).service_definitions(0);
        assert_eq!(definitions.len(), 2);

        let service = &definitions[1].service;
        assert_eq!(definitions[1].service_name, "tokens_1_0");
        assert_eq!(service.container_name.as_deref(), Some("demo_tokens_1_0"));
        assert_eq!(service.ports, vec!["5208:3000"]);
        assert_eq!(service.environment["ETHCONNECT_URL"], "http://ethconnect_1:8080");
        assert_eq!(service.environment["ETHCONNECT_INSTANCE"], "/contracts/erc1155");
        assert_eq!(service.environment["ETHCONNECT_TOPIC"], "tokens_1_0");
        assert_eq!(service.environment["AUTO_INIT"], "false");
        assert_eq!(service.depends_on["ethconnect_1"], DependsOn::started());
    }

    #[test]
    fn test_firefly_config_for_external_member() {
        let connector = connector(1);
        let mut member = connector.ctx.stack.members[0].clone();
        let config = connector.firefly_config(&member, 0);
        assert_eq!(config.plugin, "fftokens");
        assert_eq!(config.name, "erc1155");
        assert_eq!(config.url, "http://tokens_0_0:3000");

        member.external = true;
        assert_eq!(connector.firefly_config(&member, 0).url, "http://127.0.0.1:5108");
    }
}
