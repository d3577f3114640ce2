//! LedgerFlow Container
//!
//! Everything that talks to the container engine or waits on a service:
//!
//! - [`compose`]: typed docker compose manifest
//! - [`command`]: argument builders for `docker` and `docker compose`
//! - [`runtime`]: the [`ContainerRuntime`] seam and its `docker` CLI implementation
//! - [`probe`]: TCP port checks and readiness waits
//! - [`http`]: JSON over HTTP with fixed retry

pub mod command;
pub mod compose;
pub mod error;
pub mod http;
pub mod probe;
pub mod runtime;

pub use command::{ComposeCommand, DockerCommand, RunSpec};
pub use compose::{
    ComposeFile, DependsOn, HealthCheck, LoggingConfig, Service, ServiceDefinition, VolumeSpec,
};
pub use error::{ContainerError, Result};
pub use http::{http_json, http_json_with_retry};
pub use probe::{check_ports_available, is_port_available, wait_for_port};
pub use runtime::{ComposeAction, ContainerRuntime, DockerCli};
