//! Everything a provider needs to act on one stack

use ledgerflow_container::ContainerRuntime;
use ledgerflow_core::{Member, Stack, StackLayout};
use std::sync::Arc;
use std::time::Duration;

/// Retry budgets used by provider readiness and HTTP calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTiming {
    pub unlock_retries: u32,
    pub http_retries: u32,
    pub retry_period: Duration,
}

impl Default for ProviderTiming {
    fn default() -> Self {
        Self {
            unlock_retries: 10,
            http_retries: ledgerflow_container::http::DEFAULT_RETRIES,
            retry_period: ledgerflow_container::http::DEFAULT_RETRY_PERIOD,
        }
    }
}

impl ProviderTiming {
    /// No waiting between attempts
    pub fn immediate() -> Self {
        Self {
            unlock_retries: 1,
            http_retries: 1,
            retry_period: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
pub struct ProviderContext {
    pub stack: Arc<Stack>,
    pub layout: StackLayout,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub http: reqwest::Client,
    pub timing: ProviderTiming,
}

impl ProviderContext {
    pub fn new(stack: Arc<Stack>, layout: StackLayout, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            stack,
            layout,
            runtime,
            http: reqwest::Client::new(),
            timing: ProviderTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: ProviderTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn stack_name(&self) -> &str {
        &self.stack.name
    }

    pub fn volume(&self, volume: &str) -> String {
        self.stack.volume_name(volume)
    }

    pub fn container(&self, service: &str) -> String {
        self.stack.container_name(service)
    }

    /// First member whose core container is run by the stack
    pub fn first_managed_member(&self) -> Option<&Member> {
        self.stack.managed_members().next()
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("stack", &self.stack.name)
            .field("layout", &self.layout)
            .field("timing", &self.timing)
            .finish()
    }
}
