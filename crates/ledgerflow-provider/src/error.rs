//! Provider error types

use ledgerflow_container::ContainerError;
use ledgerflow_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("token providers are not supported on a fabric stack")]
    TokensOnFabric,

    #[error("a remote RPC URL is required for the remote-rpc blockchain provider")]
    MissingRemoteUrl,

    #[error("no private key available for member {0}")]
    MissingPrivateKey(String),

    #[error("you must pre-deploy your FireFly contract when using a remote RPC endpoint")]
    PredeployRequired,

    #[error("unable to extract contracts from container - no valid {0} containers found in stack")]
    NoContractSource(&'static str),

    #[error("unable to unlock account {address} for member {member}")]
    UnlockFailed { address: String, member: String },

    #[error("JSON-RPC {method} failed: {message}")]
    Rpc { method: String, message: String },

    #[error("contract '{name}' not found in {file}")]
    ContractNotFound { name: String, file: String },

    #[error("contract '{contract}' constructor takes {expected} arguments but {actual} were given")]
    ConstructorArguments {
        contract: String,
        expected: usize,
        actual: usize,
    },

    #[error("{0} not set. usage: lflow deploy <stack_name> <filename> <channel> <chaincode> <version>")]
    MissingDeployArg(&'static str),

    #[error("failed to find installed chaincode")]
    ChaincodeNotInstalled,

    #[error("unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
