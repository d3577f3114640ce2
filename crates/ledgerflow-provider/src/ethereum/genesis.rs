//! Clique genesis documents for the geth and besu dev chains

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const INITIAL_BALANCE: &str = "0x200000000000000000000000000000000000000000000000000000000000000";
/// vanity (32 bytes) + one signer (20 bytes) + seal (65 bytes), hex encoded with prefix
const EXTRA_DATA_LEN: usize = 236;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alloc {
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GethGenesis {
    pub config: GethChainConfig,
    pub nonce: String,
    pub timestamp: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub mix_hash: String,
    pub coinbase: String,
    pub alloc: BTreeMap<String, Alloc>,
    pub number: String,
    pub gas_used: String,
    pub parent_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GethChainConfig {
    pub chain_id: u64,
    pub homestead_block: u64,
    pub eip150_block: u64,
    pub eip150_hash: String,
    pub eip155_block: u64,
    pub eip158_block: u64,
    pub byzantium_block: u64,
    pub constantinople_block: u64,
    pub petersburg_block: u64,
    pub istanbul_block: u64,
    pub clique: GethClique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GethClique {
    pub period: u64,
    pub epoch: u64,
}

impl GethGenesis {
    pub fn new(chain_id: u64, addresses: &[String]) -> Self {
        Self {
            config: GethChainConfig {
                chain_id,
                homestead_block: 0,
                eip150_block: 0,
                eip150_hash: ZERO_HASH.to_string(),
                eip155_block: 0,
                eip158_block: 0,
                byzantium_block: 0,
                constantinople_block: 0,
                petersburg_block: 0,
                istanbul_block: 0,
                clique: GethClique {
                    period: 0,
                    epoch: 30000,
                },
            },
            nonce: "0x0".to_string(),
            timestamp: "0x60edb1c7".to_string(),
            extra_data: extra_data(addresses),
            gas_limit: "0x47b760".to_string(),
            difficulty: "0x1".to_string(),
            mix_hash: ZERO_HASH.to_string(),
            coinbase: ZERO_ADDRESS.to_string(),
            alloc: alloc(addresses),
            number: "0x0".to_string(),
            gas_used: "0x0".to_string(),
            parent_hash: ZERO_HASH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BesuGenesis {
    pub config: BesuChainConfig,
    pub nonce: String,
    pub timestamp: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub mix_hash: String,
    pub coinbase: String,
    pub alloc: BTreeMap<String, Alloc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BesuChainConfig {
    pub chain_id: u64,
    pub constantinople_fix_block: u64,
    pub clique: BesuClique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BesuClique {
    pub blockperiodseconds: u64,
    pub epochlength: u64,
}

impl BesuGenesis {
    /// `validator` seals blocks, `accounts` are funded
    pub fn new(chain_id: u64, validator: &str, accounts: &[String]) -> Self {
        Self {
            config: BesuChainConfig {
                chain_id,
                constantinople_fix_block: 0,
                clique: BesuClique {
                    blockperiodseconds: 2,
                    epochlength: 30000,
                },
            },
            nonce: "0x0".to_string(),
            timestamp: "0x60edb1c7".to_string(),
            extra_data: extra_data(&[validator.to_string()]),
            gas_limit: "0x1fffffffffffff".to_string(),
            difficulty: "0x1".to_string(),
            mix_hash: ZERO_HASH.to_string(),
            coinbase: ZERO_ADDRESS.to_string(),
            alloc: alloc(accounts),
        }
    }
}

/// Clique `extraData`: 32 zero bytes, the signer addresses, then zero padding
pub fn extra_data(addresses: &[String]) -> String {
    let mut data = ZERO_HASH.to_string();
    for address in addresses {
        data.push_str(address.trim_start_matches("0x"));
    }
    while data.len() < EXTRA_DATA_LEN {
        data.push('0');
    }
    data
}

fn alloc(addresses: &[String]) -> BTreeMap<String, Alloc> {
    addresses
        .iter()
        .map(|address| {
            (
                address.trim_start_matches("0x").to_string(),
                Alloc {
                    balance: INITIAL_BALANCE.to_string(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn test_extra_data_single_signer() {
        let data = extra_data(&[ADDRESS.to_string()]);
        assert_eq!(data.len(), 236);
        assert!(data.starts_with(ZERO_HASH));
        assert_eq!(&data[66..106], "7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert!(data[106..].chars().all(|c| c == '0'));
    }

    #[test]
    fn test_geth_genesis_json() {
        let genesis = GethGenesis::new(2021, &[ADDRESS.to_string()]);
        let json = serde_json::to_value(&genesis).unwrap();

        assert_eq!(json["config"]["chainId"], 2021);
        assert_eq!(json["config"]["clique"]["epoch"], 30000);
        assert_eq!(json["config"]["eip150Hash"], ZERO_HASH);
        assert_eq!(json["gasLimit"], "0x47b760");
        assert_eq!(
            json["alloc"]["7e5f4552091a69125d5dfcb7b8c2659029395bdf"]["balance"],
            INITIAL_BALANCE
        );
    }

    #[test]
    fn test_besu_genesis_seals_with_validator_only() {
        let validator = "0x1111111111111111111111111111111111111111";
        let genesis = BesuGenesis::new(1337, validator, &[ADDRESS.to_string()]);
        assert!(genesis.extra_data.contains("1111111111111111111111111111111111111111"));
        assert!(!genesis.extra_data.contains("7e5f4552"));
        assert!(genesis.alloc.contains_key("7e5f4552091a69125d5dfcb7b8c2659029395bdf"));
        assert_eq!(genesis.config.chain_id, 1337);
    }
}
