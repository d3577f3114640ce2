use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the user config directory")]
    ConfigDirNotFound,

    #[error("could not determine the user home directory")]
    HomeDirNotFound,

    #[error("failed to parse settings file {path}: {source}")]
    InvalidSettings {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
