//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown blockchain provider '{0}'. valid options are: geth, besu, fabric, remote-rpc")]
    UnknownBlockchainProvider(String),

    #[error("unknown token provider '{0}'. valid options are: erc1155, erc20_erc721")]
    UnknownTokenProvider(String),

    #[error("\"{0}\" is not a valid database selection. valid options are: postgres, sqlite3")]
    InvalidDatabase(String),

    #[error("a stack needs at least one member")]
    NoMembers,

    #[error("invalid stack configuration: {0}")]
    InvalidConfig(String),

    #[error("key generation failed: {0}")]
    Key(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
