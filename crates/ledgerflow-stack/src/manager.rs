//! Stack lifecycle
//!
//! ```text
//! init ──► start (first run: 13 step setup, rolled back on failure)
//!            │
//!            ▼
//!          running ◄──► stop
//!            │
//!   reset (back to init) / remove (gone)
//! ```

use crate::credentials::{self, CredentialGenerator, OpensslCli};
use crate::error::{Result, StackError};
use crate::generator;
use crate::identity::{self, RegistrationTiming};
use crate::manifest::{self, GithubReleases, ManifestSource};
use crate::repository::{StackRepository, validate_name};
use crate::setup::{LogObserver, SetupObserver, SetupStep};
use chrono::Utc;
use serde::Serialize;
use ledgerflow_container::{
    ComposeAction, ComposeFile, ContainerRuntime, check_ports_available, is_port_available,
    wait_for_port,
};
use ledgerflow_core::{
    BlockchainKind, DatabaseKind, DeployedContract, InitOptions, KeyPair, Member, PortExtras,
    PullOptions, Stack, StackLayout, StartOptions, TokenKind, allocate, generate_swarm_key,
    merge_yaml,
};
use ledgerflow_provider::{
    BlockchainProvider, ProviderContext, ProviderError, ProviderTiming, TokenProvider,
    select_blockchain, select_tokens,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DATAEXCHANGE_CONFIG_FILE: &str = "config.json";
const PROMETHEUS_CONFIG_FILE: &str = "prometheus.yml";
const CORE_CONFIG_TARGET: &str = "firefly.core.yml";
const MAX_PORT_BLOCK: u64 = 100;

/// Wait budgets of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub provider: ProviderTiming,
    pub registration: RegistrationTiming,
    pub external_start_retries: u32,
    pub external_start_period: Duration,
    pub pull_retry_period: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            provider: ProviderTiming::default(),
            registration: RegistrationTiming::default(),
            external_start_retries: 120,
            external_start_period: Duration::from_secs(1),
            pull_retry_period: Duration::from_secs(1),
        }
    }
}

impl Timing {
    /// Single attempts with no sleeping
    pub fn immediate() -> Self {
        Self {
            provider: ProviderTiming::immediate(),
            registration: RegistrationTiming {
                http_retries: 1,
                org_poll_retries: 0,
                period: Duration::ZERO,
            },
            external_start_retries: 1,
            external_start_period: Duration::ZERO,
            pull_retry_period: Duration::ZERO,
        }
    }
}

/// What `info` reports about a stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    pub images: String,
    pub containers: String,
    pub compose_file: PathBuf,
}

/// One member's signing account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub member_id: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// A loaded stack with its providers selected
struct ActiveStack {
    stack: Stack,
    layout: StackLayout,
    blockchain: Arc<dyn BlockchainProvider>,
    tokens: Vec<Arc<dyn TokenProvider>>,
}

pub struct StackManager {
    repository: StackRepository,
    runtime: Arc<dyn ContainerRuntime>,
    credentials: Arc<dyn CredentialGenerator>,
    manifests: Arc<dyn ManifestSource>,
    observer: Arc<dyn SetupObserver>,
    http: reqwest::Client,
    timing: Timing,
}

impl StackManager {
    pub fn new(repository: StackRepository, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            repository,
            runtime,
            credentials: Arc::new(OpensslCli),
            manifests: Arc::new(GithubReleases::default()),
            observer: Arc::new(LogObserver),
            http: reqwest::Client::new(),
            timing: Timing::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialGenerator>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_manifest_source(mut self, manifests: Arc<dyn ManifestSource>) -> Self {
        self.manifests = manifests;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SetupObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn repository(&self) -> &StackRepository {
        &self.repository
    }

    pub fn list(&self) -> Result<Vec<String>> {
        self.repository.list()
    }

    pub fn load(&self, name: &str) -> Result<Stack> {
        self.repository.load(name)
    }

    fn activate(&self, stack: Stack) -> Result<ActiveStack> {
        let layout = self.repository.layout(&stack.name);
        let ctx = ProviderContext::new(Arc::new(stack.clone()), layout.clone(), self.runtime.clone())
            .with_timing(self.timing.provider);
        let blockchain = select_blockchain(&ctx)?;
        let tokens = select_tokens(&ctx)?;
        Ok(ActiveStack {
            stack,
            layout,
            blockchain,
            tokens,
        })
    }

    fn open(&self, name: &str) -> Result<ActiveStack> {
        let stack = self.repository.load(name)?;
        self.activate(stack)
    }

    // ---- init ----

    /// Create a new stack under `init/` without touching the container engine
    pub async fn init(&self, name: &str, member_count: usize, options: &InitOptions) -> Result<Stack> {
        validate_name(name)?;
        if self.repository.exists(name) {
            return Err(StackError::AlreadyExists(name.to_string()));
        }
        check_member_count(member_count, options)?;
        check_token_count(options)?;

        let kind: BlockchainKind = options.blockchain_provider.parse()?;
        for token in &options.token_providers {
            token.parse::<TokenKind>()?;
        }
        if kind == BlockchainKind::RemoteRpc
            && options.remote_node_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ProviderError::MissingRemoteUrl.into());
        }

        let manifest = manifest::resolve(self.manifests.as_ref(), options).await?;
        let mut stack = build_stack(name, member_count, options);
        stack.version_manifest = manifest;
        stack.validate()?;

        let active = self.activate(stack)?;
        check_ports_available(&generator::preflight_ports(&active.stack)).await?;

        tracing::info!("Initializing stack '{}' with {} members", name, member_count);
        if let Err(e) = self.write_stack(&active, options).await {
            if let Err(cleanup) = std::fs::remove_dir_all(&active.layout.stack_dir) {
                tracing::warn!(
                    "failed to remove {}: {}",
                    active.layout.stack_dir.display(),
                    cleanup
                );
            }
            return Err(e);
        }
        Ok(active.stack)
    }

    async fn write_stack(&self, active: &ActiveStack, options: &InitOptions) -> Result<()> {
        let stack = &active.stack;
        let layout = &active.layout;
        let config_dir = layout.init_config_dir();

        std::fs::create_dir_all(&config_dir)?;
        for member in &stack.members {
            std::fs::create_dir_all(dataexchange_dir(&config_dir, member).join("peer-certs"))?;
            std::fs::create_dir_all(layout.init_blockchain_dir().join(&member.id))?;
        }

        let definitions =
            generator::provider_definitions(active.blockchain.as_ref(), &active.tokens);
        generator::compose_file(stack, definitions).write(&layout.init_dir)?;

        for member in &stack.members {
            let dir = dataexchange_dir(&config_dir, member);
            self.credentials.self_signed(&dir, &member.id).await?;
            std::fs::write(
                dir.join(DATAEXCHANGE_CONFIG_FILE),
                serde_json::to_string_pretty(&generator::dataexchange_config(member))?,
            )?;
        }

        self.write_core_configs(active, options.extra_core_config.as_deref())?;

        if stack.prometheus_enabled {
            std::fs::write(
                config_dir.join(PROMETHEUS_CONFIG_FILE),
                serde_yaml::to_string(&generator::prometheus_config(stack))?,
            )?;
        }

        active.blockchain.write_config(options).await?;
        self.repository.save(stack)
    }

    fn write_core_configs(&self, active: &ActiveStack, extra: Option<&Path>) -> Result<()> {
        let extra = match extra {
            Some(path) => Some(serde_yaml::from_str::<serde_yaml::Value>(
                &std::fs::read_to_string(path)?,
            )?),
            None => None,
        };

        let config_dir = active.layout.init_config_dir();
        for member in &active.stack.members {
            let config = generator::core_config(
                &active.stack,
                &active.layout,
                member,
                active.blockchain.as_ref(),
                &active.tokens,
            );
            let mut value = config.to_value()?;
            if let Some(extra) = &extra {
                merge_yaml(&mut value, extra.clone());
            }
            std::fs::write(
                config_dir.join(member.core_config_file()),
                serde_yaml::to_string(&value)?,
            )?;
        }
        Ok(())
    }

    // ---- start ----

    pub async fn start(&self, name: &str, options: &StartOptions) -> Result<Stack> {
        let active = self.open(name)?;
        check_ports_available(&generator::preflight_ports(&active.stack)).await?;

        if active.layout.has_run_before() {
            tracing::info!("Starting stack '{}'", name);
            self.run_startup(&active, false).await?;
            self.wait_for_external_members(&active, false).await?;
            return Ok(active.stack);
        }

        tracing::info!("Starting stack '{}' for the first time", name);
        match self.first_time_setup(&active).await {
            Ok(deployed) => {
                let mut stack = active.stack;
                stack.deployed_contracts = deployed;
                self.repository.save(&stack)?;
                Ok(stack)
            }
            Err(cause) if options.no_rollback => Err(cause),
            Err(cause) => {
                tracing::warn!("an error occurred - rolling back changes");
                match self.reset_to_template(&active).await {
                    Ok(()) => Err(StackError::RolledBack {
                        cause: Box::new(cause),
                    }),
                    Err(reset) => Err(StackError::ResetFailed {
                        cause: Box::new(cause),
                        reset: Box::new(reset),
                    }),
                }
            }
        }
    }

    /// Report `work` to the observer and tag its error with `step`
    async fn step<T>(&self, step: SetupStep, work: impl Future<Output = Result<T>>) -> Result<T> {
        self.observer.step_started(step);
        let started = Instant::now();
        match work.await {
            Ok(value) => {
                self.observer.step_succeeded(step, started.elapsed());
                Ok(value)
            }
            Err(e) => {
                self.observer
                    .step_failed(step, &e.to_string(), started.elapsed());
                Err(StackError::Setup {
                    step,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn first_time_setup(&self, active: &ActiveStack) -> Result<Vec<DeployedContract>> {
        let stack = &active.stack;
        let layout = &active.layout;
        let mut deployed = Vec::new();

        self.step(SetupStep::CopyRuntime, async {
            copy_dir(&layout.init_dir, &layout.runtime_dir)
        })
        .await?;

        let entrypoints = self
            .step(SetupStep::DisableCore, async {
                disable_core(stack, &layout.runtime_dir)
            })
            .await?;

        self.step(SetupStep::InitBlockchain, async {
            Ok(active.blockchain.first_time_setup().await?)
        })
        .await?;

        if stack.prometheus_enabled {
            self.step(SetupStep::CopyPrometheusConfig, self.copy_prometheus_config(active))
                .await?;
        }

        self.step(
            SetupStep::CopyDataExchangeConfig,
            self.copy_dataexchange_config(active),
        )
        .await?;

        self.step(SetupStep::StartDependencies, self.run_startup(active, true))
            .await?;

        let token_contracts = self
            .step(SetupStep::DeployTokenContracts, self.deploy_token_contracts(active))
            .await?;
        deployed.extend(token_contracts);

        if stack.contract_address.as_deref().is_none_or(str::is_empty) {
            let contract = self
                .step(
                    SetupStep::DeployFireflyContract,
                    self.deploy_firefly_contract(active),
                )
                .await?;
            deployed.push(contract);
        }

        self.step(
            SetupStep::ConfigureCore,
            self.configure_core(active, &entrypoints),
        )
        .await?;

        self.step(SetupStep::StartCore, async {
            self.compose(&layout.runtime_dir, stack, ComposeAction::Up)
                .await
                .map(|_| ())
        })
        .await?;

        self.step(
            SetupStep::WaitExternalMembers,
            self.wait_for_external_members(active, true),
        )
        .await?;

        self.step(SetupStep::RegisterIdentities, async {
            identity::register_identities(&self.http, &stack.members, self.timing.registration)
                .await
        })
        .await?;

        self.step(SetupStep::InitTokens, async {
            for (index, provider) in active.tokens.iter().enumerate() {
                provider.first_time_setup(index).await?;
            }
            Ok(())
        })
        .await?;

        Ok(deployed)
    }

    async fn compose(&self, dir: &Path, stack: &Stack, action: ComposeAction) -> Result<String> {
        Ok(self.runtime.compose(dir, &stack.name, action).await?)
    }

    async fn copy_prometheus_config(&self, active: &ActiveStack) -> Result<()> {
        let source = active
            .layout
            .runtime_config_dir()
            .join(PROMETHEUS_CONFIG_FILE);
        let volume = active.stack.volume_name("prometheus_config");
        self.runtime
            .copy_to_volume(&volume, &source, PROMETHEUS_CONFIG_FILE)
            .await?;
        Ok(())
    }

    async fn copy_dataexchange_config(&self, active: &ActiveStack) -> Result<()> {
        let config_dir = active.layout.runtime_config_dir();
        for member in &active.stack.members {
            let volume = active
                .stack
                .volume_name(&format!("dataexchange_{}", member.id));
            let dir = dataexchange_dir(&config_dir, member);
            self.runtime.mkdir_in_volume(&volume, "peer-certs").await?;
            for file in [
                DATAEXCHANGE_CONFIG_FILE,
                credentials::CERT_FILE,
                credentials::KEY_FILE,
            ] {
                self.runtime
                    .copy_to_volume(&volume, &dir.join(file), file)
                    .await?;
            }
        }
        Ok(())
    }

    /// pre_start, `compose up -d` from `runtime/`, post_start
    async fn run_startup(&self, active: &ActiveStack, first_time_setup: bool) -> Result<()> {
        active.blockchain.pre_start().await?;
        self.compose(&active.layout.runtime_dir, &active.stack, ComposeAction::Up)
            .await?;
        active.blockchain.post_start(first_time_setup).await?;
        Ok(())
    }

    async fn deploy_token_contracts(&self, active: &ActiveStack) -> Result<Vec<DeployedContract>> {
        let mut deployed = Vec::new();
        for (index, provider) in active.tokens.iter().enumerate() {
            deployed.extend(provider.deploy_smart_contracts(index).await?);
        }
        Ok(deployed)
    }

    async fn deploy_firefly_contract(&self, active: &ActiveStack) -> Result<DeployedContract> {
        let result = active.blockchain.deploy_firefly_contract().await?;
        tracing::info!("{}", result.message);
        if let Some(patch) = &result.config_patch {
            patch_core_configs(&active.stack, &active.layout.runtime_config_dir(), patch)?;
        }
        Ok(result.deployed)
    }

    async fn configure_core(
        &self,
        active: &ActiveStack,
        entrypoints: &BTreeMap<String, Vec<String>>,
    ) -> Result<()> {
        let config_dir = active.layout.runtime_config_dir();
        for member in active.stack.managed_members() {
            tracing::info!("Copying core config to {}", member.core_service());
            let volume = active.stack.volume_name(&member.core_service());
            self.runtime
                .copy_to_volume(
                    &volume,
                    &config_dir.join(member.core_config_file()),
                    CORE_CONFIG_TARGET,
                )
                .await?;
        }
        enable_core(&active.stack, &active.layout.runtime_dir, entrypoints)
    }

    /// Wait for operator-run cores, on the admin port during first setup
    async fn wait_for_external_members(&self, active: &ActiveStack, first_time_setup: bool) -> Result<()> {
        for member in active.stack.members.iter().filter(|m| m.external) {
            let port = if first_time_setup {
                member.ports.admin
            } else {
                member.ports.firefly
            };
            if !is_port_available(port).await {
                continue;
            }
            let config = active
                .layout
                .runtime_config_dir()
                .join(member.core_config_file());
            self.observer.notice(&format!(
                "please start your firefly core with the config file for this stack: firefly -f {}",
                config.display()
            ));
            wait_for_port(
                "firefly",
                port,
                self.timing.external_start_retries,
                self.timing.external_start_period,
            )
            .await?;
        }
        Ok(())
    }

    // ---- stop / reset / remove ----

    pub async fn stop(&self, name: &str) -> Result<()> {
        let stack = self.repository.load(name)?;
        let layout = self.repository.layout(name);
        tracing::info!("Stopping stack '{}'", name);
        self.compose(&layout.init_dir, &stack, ComposeAction::Stop)
            .await?;
        Ok(())
    }

    /// Return a stack to the state right after `init`
    pub async fn reset(&self, name: &str) -> Result<()> {
        let active = self.open(name)?;
        tracing::info!("Resetting stack '{}'", name);
        self.reset_to_template(&active).await
    }

    /// Containers and volumes down, `runtime/` gone, `init/` untouched.
    /// Also the rollback of a failed first start.
    async fn reset_to_template(&self, active: &ActiveStack) -> Result<()> {
        self.compose(&active.layout.init_dir, &active.stack, ComposeAction::Down)
            .await?;
        self.remove_volumes(active).await;
        if active.layout.runtime_dir.exists() {
            std::fs::remove_dir_all(&active.layout.runtime_dir)?;
        }
        active.blockchain.reset().await?;
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let active = self.open(name)?;
        tracing::info!("Removing stack '{}'", name);
        self.compose(&active.layout.init_dir, &active.stack, ComposeAction::Down)
            .await?;
        self.remove_volumes(&active).await;
        self.repository.delete(name)
    }

    /// Remove every named volume of the stack. Failures are only logged.
    async fn remove_volumes(&self, active: &ActiveStack) {
        let definitions =
            generator::provider_definitions(active.blockchain.as_ref(), &active.tokens);
        let compose = generator::compose_file(&active.stack, definitions);
        for volume in compose.volumes.keys() {
            let name = active.stack.volume_name(volume);
            if let Err(e) = self.runtime.remove_volume(&name).await {
                tracing::warn!("failed to remove volume {}: {}", name, e);
            }
        }
    }

    // ---- pull / info / logs ----

    /// Every image the stack runs, in pull order
    pub fn images(&self, name: &str) -> Result<Vec<String>> {
        let active = self.open(name)?;
        Ok(stack_images(&active))
    }

    pub async fn pull(&self, name: &str, options: &PullOptions) -> Result<()> {
        let active = self.open(name)?;
        self.pull_images(&active, options.retries).await
    }

    /// Take the containers down and fetch the images again. Data volumes
    /// and `runtime/` stay.
    pub async fn upgrade(&self, name: &str, options: &PullOptions) -> Result<()> {
        let active = self.open(name)?;
        tracing::info!("Upgrading stack '{}'", name);
        self.compose(&active.layout.init_dir, &active.stack, ComposeAction::Down)
            .await?;
        self.pull_images(&active, options.retries).await
    }

    async fn pull_images(&self, active: &ActiveStack, retries: u32) -> Result<()> {
        for image in stack_images(active) {
            tracing::info!("Pulling {}", image);
            self.pull_with_retry(&image, retries).await?;
        }
        Ok(())
    }

    async fn pull_with_retry(&self, image: &str, retries: u32) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.runtime.pull(image).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < retries => {
                    attempt += 1;
                    tracing::warn!("pull of {} failed ({}), retry {}/{}", image, e, attempt, retries);
                    tokio::time::sleep(self.timing.pull_retry_period).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn info(&self, name: &str) -> Result<StackInfo> {
        let stack = self.repository.load(name)?;
        let layout = self.repository.layout(name);
        let images = self
            .compose(&layout.init_dir, &stack, ComposeAction::Images)
            .await?;
        let containers = self
            .compose(&layout.init_dir, &stack, ComposeAction::Ps)
            .await?;
        Ok(StackInfo {
            images,
            containers,
            compose_file: StackLayout::compose_file(&layout.init_dir),
        })
    }

    pub async fn logs(&self, name: &str, follow: bool) -> Result<String> {
        let stack = self.repository.load(name)?;
        let layout = self.repository.layout(name);
        self.compose(&layout.init_dir, &stack, ComposeAction::Logs { follow })
            .await
    }

    // ---- accounts ----

    /// Member accounts, with the private key the blockchain backend wrote
    /// at init
    pub fn accounts(&self, name: &str) -> Result<Vec<Account>> {
        let active = self.open(name)?;
        active
            .stack
            .members
            .iter()
            .map(|member| {
                let private_key = active.blockchain.account_key(member)?;
                if let Some(key) = &private_key {
                    let derived = KeyPair::from_private_key_hex(key)?;
                    if !derived.address.eq_ignore_ascii_case(&member.address) {
                        return Err(StackError::KeyMismatch {
                            member: member.id.clone(),
                            address: member.address.clone(),
                        });
                    }
                }
                Ok(Account {
                    member_id: member.id.clone(),
                    address: member.address.clone(),
                    private_key,
                })
            })
            .collect()
    }

    // ---- custom contracts ----

    pub fn contracts(&self, name: &str, file: &Path) -> Result<Vec<String>> {
        let active = self.open(name)?;
        Ok(active.blockchain.contracts(file)?)
    }

    pub async fn deploy_contract(
        &self,
        name: &str,
        file: &Path,
        contract_name: &str,
        member_index: usize,
        extra_args: &[String],
    ) -> Result<DeployedContract> {
        let active = self.open(name)?;
        let member = active
            .stack
            .member(member_index)
            .ok_or(StackError::MemberOutOfRange {
                index: member_index,
                count: active.stack.members.len(),
            })?;
        Ok(active
            .blockchain
            .deploy_contract(file, contract_name, member, extra_args)
            .await?)
    }
}

fn check_member_count(member_count: usize, options: &InitOptions) -> Result<()> {
    let count = u32::try_from(member_count)
        .ok()
        .filter(|count| *count > 0)
        .ok_or(StackError::InvalidMemberCount(member_count))?;
    // every member block has to fit below the last port
    let last_block = u64::from(options.services_base_port) + u64::from(count) * MAX_PORT_BLOCK;
    let last_firefly = u64::from(options.firefly_base_port) + u64::from(count);
    if last_block > u64::from(u16::MAX) || last_firefly > u64::from(u16::MAX) {
        return Err(StackError::InvalidMemberCount(member_count));
    }
    Ok(())
}

fn check_token_count(options: &InitOptions) -> Result<()> {
    let extras = port_extras(options);
    if !extras.fits_block() {
        return Err(StackError::TooManyTokenProviders {
            count: extras.token_count,
            max: PortExtras::max_token_count(extras.metrics),
        });
    }
    Ok(())
}

fn port_extras(options: &InitOptions) -> PortExtras {
    PortExtras {
        metrics: options.prometheus_enabled,
        token_count: options.token_providers.len(),
    }
}

fn build_stack(name: &str, member_count: usize, options: &InitOptions) -> Stack {
    let extras = port_extras(options);
    let members = (0..member_count)
        .map(|index| {
            let keys = KeyPair::generate();
            Member {
                id: index.to_string(),
                index,
                address: keys.address,
                private_key: Some(keys.private_key),
                org_name: options.org_name(index),
                node_name: options.node_name(index),
                external: index < options.external_processes,
                ports: allocate(
                    options.services_base_port,
                    options.firefly_base_port,
                    index,
                    extras,
                ),
            }
        })
        .collect();

    Stack {
        name: name.to_string(),
        members,
        swarm_key: generate_swarm_key(),
        exposed_blockchain_port: options.services_base_port,
        database: options.database,
        blockchain_provider: options.blockchain_provider.trim().to_lowercase(),
        token_providers: options
            .token_providers
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect(),
        contract_address: options.contract_address.clone().filter(|a| !a.is_empty()),
        chain_id: options.chain_id,
        remote_node_url: options.remote_node_url.clone(),
        prometheus_enabled: options.prometheus_enabled,
        exposed_prometheus_port: options.prometheus_enabled.then_some(options.prometheus_port),
        version_manifest: Default::default(),
        created_at: Utc::now(),
        deployed_contracts: vec![],
    }
}

fn stack_images(active: &ActiveStack) -> Vec<String> {
    let stack = &active.stack;
    let mut images: Vec<String> = stack
        .version_manifest
        .entries()
        .into_iter()
        .filter(|entry| !entry.local)
        .map(|entry| entry.image_ref())
        .collect();
    images.push(generator::IPFS_IMAGE.to_string());
    if stack.database == DatabaseKind::Postgres {
        images.push(generator::POSTGRES_IMAGE.to_string());
    }
    if stack.prometheus_enabled {
        images.push(generator::PROMETHEUS_IMAGE.to_string());
    }
    for definition in generator::provider_definitions(active.blockchain.as_ref(), &active.tokens) {
        images.push(definition.service.image);
    }

    let mut seen = std::collections::HashSet::new();
    images.retain(|image| seen.insert(image.clone()));
    images
}

fn dataexchange_dir(config_dir: &Path, member: &Member) -> PathBuf {
    config_dir.join(format!("dataexchange_{}", member.id))
}

/// Recursive copy of `source` into `dest`
fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Park every managed core on a no-op entrypoint, returning the ones replaced
fn disable_core(stack: &Stack, dir: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let mut compose = ComposeFile::read(dir)?;
    let mut cached = BTreeMap::new();
    for member in stack.managed_members() {
        let name = member.core_service();
        if let Some(service) = compose.services.get_mut(&name)
            && let Some(previous) = service.entrypoint.replace(generator::disabled_entrypoint())
            && !previous.is_empty()
        {
            cached.insert(name, previous);
        }
    }
    compose.write(dir)?;
    Ok(cached)
}

fn enable_core(stack: &Stack, dir: &Path, cached: &BTreeMap<String, Vec<String>>) -> Result<()> {
    let mut compose = ComposeFile::read(dir)?;
    for member in stack.managed_members() {
        let name = member.core_service();
        if let Some(service) = compose.services.get_mut(&name) {
            service.entrypoint = Some(
                cached
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(generator::default_entrypoint),
            );
        }
    }
    compose.write(dir)?;
    Ok(())
}

fn patch_core_configs(stack: &Stack, config_dir: &Path, patch: &serde_yaml::Value) -> Result<()> {
    for member in &stack.members {
        let path = config_dir.join(member.core_config_file());
        let mut config: serde_yaml::Value = serde_yaml::from_str(&std::fs::read_to_string(&path)?)?;
        merge_yaml(&mut config, patch.clone());
        tracing::info!("Updating {} config for the deployed contract", member.id);
        std::fs::write(&path, serde_yaml::to_string(&config)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_container::{Service, ServiceDefinition};

    #[test]
    fn test_member_count_bounds() {
        let options = InitOptions::default();
        assert!(check_member_count(0, &options).is_err());
        assert!(check_member_count(2, &options).is_ok());
        assert!(check_member_count(700, &options).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_member_count_does_not_wrap() {
        let options = InitOptions::default();
        let wrapped = (1usize << 32) + 1;
        assert!(matches!(
            check_member_count(wrapped, &options),
            Err(StackError::InvalidMemberCount(n)) if n == wrapped
        ));
    }

    #[test]
    fn test_token_providers_must_fit_block() {
        let options = InitOptions {
            prometheus_enabled: true,
            token_providers: vec!["erc1155".to_string(); 92],
            ..Default::default()
        };
        assert!(matches!(
            check_token_count(&options),
            Err(StackError::TooManyTokenProviders { count: 92, max: 91 })
        ));

        let options = InitOptions {
            token_providers: vec!["erc1155".to_string(); 92],
            ..Default::default()
        };
        assert!(check_token_count(&options).is_ok());
    }

    #[test]
    fn test_build_stack_marks_external_members() {
        let options = InitOptions {
            external_processes: 1,
            prometheus_enabled: true,
            token_providers: vec!["ERC1155".to_string()],
            ..Default::default()
        };
        let stack = build_stack("demo", 2, &options);

        assert!(stack.members[0].external);
        assert!(!stack.members[1].external);
        assert_eq!(stack.token_providers, vec!["erc1155"]);
        assert_eq!(stack.exposed_prometheus_port, Some(9090));
        assert_eq!(stack.members[1].ports.metrics, Some(5208));
        assert_eq!(stack.members[1].ports.tokens, vec![5209]);
        assert!(stack.members.iter().all(|m| m.private_key.is_some()));
    }

    #[test]
    fn test_entrypoints_are_parked_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        let stack = build_stack("demo", 2, &InitOptions::default());
        let mut compose = ComposeFile::default();
        compose.add_definition(ServiceDefinition {
            service_name: "firefly_core_0".to_string(),
            service: Service::new("ghcr.io/hyperledger/firefly:latest"),
            volume_names: vec![],
        });
        let mut custom = Service::new("ghcr.io/hyperledger/firefly:latest");
        custom.entrypoint = Some(vec!["firefly".to_string(), "-f".to_string(), "x.yml".to_string()]);
        compose.add_definition(ServiceDefinition {
            service_name: "firefly_core_1".to_string(),
            service: custom,
            volume_names: vec![],
        });
        compose.write(dir.path()).unwrap();

        let cached = disable_core(&stack, dir.path()).unwrap();
        let parked = ComposeFile::read(dir.path()).unwrap();
        assert_eq!(
            parked.services["firefly_core_0"].entrypoint,
            Some(generator::disabled_entrypoint())
        );
        assert_eq!(cached.len(), 1);

        enable_core(&stack, dir.path(), &cached).unwrap();
        let restored = ComposeFile::read(dir.path()).unwrap();
        assert_eq!(
            restored.services["firefly_core_0"].entrypoint,
            Some(vec!["firefly".to_string()])
        );
        assert_eq!(
            restored.services["firefly_core_1"].entrypoint.as_ref().unwrap()[2],
            "x.yml"
        );
    }

    #[test]
    fn test_copy_dir_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("init");
        std::fs::create_dir_all(source.join("config/dataexchange_0")).unwrap();
        std::fs::write(source.join("config/dataexchange_0/cert.pem"), "cert").unwrap();
        std::fs::write(source.join("docker-compose.yml"), "version: '2.1'").unwrap();

        let dest = dir.path().join("runtime");
        copy_dir(&source, &dest).unwrap();
        assert_eq!(
            std::fs::read_to_string(dest.join("config/dataexchange_0/cert.pem")).unwrap(),
            "cert"
        );
        assert!(dest.join("docker-compose.yml").is_file());
    }

    #[test]
    fn test_patch_merges_into_every_member() {
        let dir = tempfile::tempdir().unwrap();
        let stack = build_stack("demo", 2, &InitOptions::default());
        for member in &stack.members {
            std::fs::write(
                dir.path().join(member.core_config_file()),
                "blockchain:\n  ethereum:\n    ethconnect:\n      url: http://ethconnect_0:8080\n",
            )
            .unwrap();
        }
        let patch: serde_yaml::Value = serde_yaml::from_str(
            "blockchain:\n  ethereum:\n    ethconnect:\n      instance: /instances/0xabc\n",
        )
        .unwrap();

        patch_core_configs(&stack, dir.path(), &patch).unwrap();
        let patched = std::fs::read_to_string(dir.path().join("firefly_core_1.yml")).unwrap();
        assert!(patched.contains("instance: /instances/0xabc"));
        assert!(patched.contains("url: http://ethconnect_0:8080"));
    }
}
