//! LedgerFlow の設定
//!
//! ディレクトリ解決とユーザー設定ファイル (`config.yml`) の読み込み。

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ホームディレクトリを上書きする環境変数
pub const HOME_ENV: &str = "LEDGERFLOW_HOME";
/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_ENV: &str = "LEDGERFLOW_CONFIG";

/// LedgerFlowの設定ディレクトリを取得（なければ作成）
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("ledgerflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// データのルート: `$LEDGERFLOW_HOME` または `~/.ledgerflow`
pub fn home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }
    Ok(dirs::home_dir()
        .ok_or(ConfigError::HomeDirNotFound)?
        .join(".ledgerflow"))
}

/// スタックの格納先 `<home>/stacks`
pub fn stacks_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join("stacks"))
}

/// 設定ファイルのパス
///
/// 1. 環境変数 LEDGERFLOW_CONFIG
/// 2. `<config_dir>/ledgerflow/config.yml`
pub fn settings_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join("config.yml"))
}

/// ユーザー設定。CLIフラグ未指定時のデフォルト値になる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub services_base_port: u16,
    pub firefly_base_port: u16,
    pub blockchain_provider: String,
    pub token_providers: Vec<String>,
    pub database: String,
    pub release: String,
    pub pull_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            services_base_port: 5100,
            firefly_base_port: 5000,
            blockchain_provider: "geth".to_string(),
            token_providers: vec!["erc1155".to_string()],
            database: "sqlite3".to_string(),
            release: "latest".to_string(),
            pull_retries: 3,
        }
    }
}

impl Settings {
    /// 設定ファイルを読み込む。ファイルがなければデフォルト
    pub fn load() -> Result<Self> {
        let path = settings_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidSettings {
            path: path.display().to_string(),
            source,
        })
    }
}
