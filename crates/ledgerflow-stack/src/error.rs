use crate::setup::SetupStep;
use ledgerflow_container::ContainerError;
use ledgerflow_core::CoreError;
use ledgerflow_provider::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("stack '{0}' does not exist")]
    NotFound(String),

    #[error("stack '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid stack name '{0}'")]
    InvalidName(String),

    #[error("invalid member count {0}: a stack needs at least one member")]
    InvalidMemberCount(usize),

    #[error("{count} token providers do not fit in a member port block (at most {max})")]
    TooManyTokenProviders { count: usize, max: usize },

    #[error("member {index} does not exist in a stack of {count} members")]
    MemberOutOfRange { index: usize, count: usize },

    #[error("keyfile of member {member} does not belong to {address}")]
    KeyMismatch { member: String, address: String },

    #[error("failed to resolve version manifest: {0}")]
    Manifest(String),

    #[error("failed to generate data exchange certificate for member {member}: {message}")]
    Credentials { member: String, message: String },

    #[error("timeout error waiting to register {org} and {node}")]
    RegistrationTimeout { org: String, node: String },

    #[error("{step}: {source}")]
    Setup {
        step: SetupStep,
        #[source]
        source: Box<StackError>,
    },

    #[error("{cause} - all changes rolled back, runtime directory removed")]
    RolledBack { cause: Box<StackError> },

    #[error("{cause} - error resetting stack: {reset}")]
    ResetFailed {
        cause: Box<StackError>,
        reset: Box<StackError>,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StackError {
    /// The setup step this error was raised in, if any
    pub fn step(&self) -> Option<SetupStep> {
        match self {
            Self::Setup { step, .. } => Some(*step),
            Self::RolledBack { cause } | Self::ResetFailed { cause, .. } => cause.step(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
