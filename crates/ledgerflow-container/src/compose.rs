//! docker compose manifest
//!
//! Every map is a `BTreeMap` so the same stack always serializes to the same
//! bytes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const COMPOSE_FILE: &str = "docker-compose.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    pub version: String,
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, VolumeSpec>,
}

impl Default for ComposeFile {
    fn default() -> Self {
        Self {
            version: "2.1".to_string(),
            services: BTreeMap::new(),
            volumes: BTreeMap::new(),
        }
    }
}

impl ComposeFile {
    pub fn read(dir: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(dir.join(COMPOSE_FILE))?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::write(dir.join(COMPOSE_FILE), self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Add a provider service and register its named volumes
    pub fn add_definition(&mut self, definition: ServiceDefinition) {
        for volume in definition.volume_names {
            self.volumes.insert(volume, VolumeSpec::default());
        }
        self.services.insert(definition.service_name, definition.service);
    }
}

/// Named volume entry. Always empty, compose manages the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub depends_on: BTreeMap<String, DependsOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl Service {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            logging: Some(LoggingConfig::standard()),
            ..Default::default()
        }
    }

    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn port(mut self, host: u16, container: u16) -> Self {
        self.ports.push(format!("{host}:{container}"));
        self
    }

    pub fn volume(mut self, spec: impl Into<String>) -> Self {
        self.volumes.push(spec.into());
        self
    }

    pub fn depends_on(mut self, service: impl Into<String>, condition: DependsOn) -> Self {
        self.depends_on.insert(service.into(), condition);
        self
    }

    pub fn healthcheck(mut self, healthcheck: HealthCheck) -> Self {
        self.healthcheck = Some(healthcheck);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsOn {
    pub condition: String,
}

impl DependsOn {
    pub fn started() -> Self {
        Self {
            condition: "service_started".to_string(),
        }
    }

    pub fn healthy() -> Self {
        Self {
            condition: "service_healthy".to_string(),
        }
    }

    /// Healthy when the dependency declares a health check, started otherwise
    pub fn for_service(service: &Service) -> Self {
        if service.healthcheck.is_some() {
            Self::healthy()
        } else {
            Self::started()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub test: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

impl HealthCheck {
    pub fn new<I, S>(test: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            test: test.into_iter().map(Into::into).collect(),
            interval: None,
            timeout: None,
            retries: None,
        }
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.interval = Some(interval.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.timeout = Some(timeout.to_string());
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub driver: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl LoggingConfig {
    /// json-file driver capped at a single 10 MB file
    pub fn standard() -> Self {
        Self {
            driver: "json-file".to_string(),
            options: BTreeMap::from([
                ("max-file".to_string(), "1".to_string()),
                ("max-size".to_string(), "10m".to_string()),
            ]),
        }
    }
}

/// A service contributed by a provider, with the named volumes it mounts
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub service_name: String,
    pub service: Service,
    pub volume_names: Vec<String>,
}
