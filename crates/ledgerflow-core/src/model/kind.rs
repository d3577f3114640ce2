//! Provider and database selections

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Blockchain backend of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockchainKind {
    Geth,
    Besu,
    Fabric,
    RemoteRpc,
}

impl BlockchainKind {
    pub const ALL: [BlockchainKind; 4] = [Self::Geth, Self::Besu, Self::Fabric, Self::RemoteRpc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geth => "geth",
            Self::Besu => "besu",
            Self::Fabric => "fabric",
            Self::RemoteRpc => "remote-rpc",
        }
    }

    /// EVM based backends share the ethconnect connector and token runtimes
    pub fn is_ethereum(&self) -> bool {
        !matches!(self, Self::Fabric)
    }
}

impl FromStr for BlockchainKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered)
            .ok_or_else(|| CoreError::UnknownBlockchainProvider(s.to_string()))
    }
}

impl fmt::Display for BlockchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token runtime attached to a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Erc1155,
    Erc20Erc721,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [Self::Erc1155, Self::Erc20Erc721];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Erc1155 => "erc1155",
            Self::Erc20Erc721 => "erc20_erc721",
        }
    }
}

impl FromStr for TokenKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered)
            .ok_or_else(|| CoreError::UnknownTokenProvider(s.to_string()))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database used by each node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Postgres,
    #[default]
    Sqlite3,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite3 => "sqlite3",
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "sqlite3" => Ok(Self::Sqlite3),
            _ => Err(CoreError::InvalidDatabase(s.to_string())),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blockchain_kind_roundtrip() {
        for kind in BlockchainKind::ALL {
            assert_eq!(kind.as_str().parse::<BlockchainKind>().unwrap(), kind);
        }
        assert_eq!("GETH".parse::<BlockchainKind>().unwrap(), BlockchainKind::Geth);
    }

    #[test]
    fn test_unknown_kinds_are_errors() {
        let err = "quorum".parse::<BlockchainKind>().unwrap_err();
        assert!(err.to_string().contains("unknown blockchain provider 'quorum'"));

        let err = "erc777".parse::<TokenKind>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownTokenProvider(_)));

        let err = "mysql".parse::<DatabaseKind>().unwrap_err();
        assert!(err.to_string().contains("not a valid database selection"));
    }

    #[test]
    fn test_fabric_is_not_ethereum() {
        assert!(BlockchainKind::Geth.is_ethereum());
        assert!(BlockchainKind::RemoteRpc.is_ethereum());
        assert!(!BlockchainKind::Fabric.is_ethereum());
    }
}
