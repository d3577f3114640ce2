use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("port {0} is unavailable. please check to see if another process is listening on that port")]
    PortUnavailable(u16),

    #[error("waited for {waited_secs} seconds for {target} to start on port {port} but it was never available")]
    ReadinessTimeout {
        target: String,
        port: u16,
        waited_secs: u64,
        elapsed: Duration,
    },

    #[error("{url} returned {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
