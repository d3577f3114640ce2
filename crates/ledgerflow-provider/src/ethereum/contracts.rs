//! Compiled contract readers

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

/// Build artifact with `abi` and `bytecode`, as shipped inside the core and
/// token connector images
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompiledContract {
    pub abi: serde_json::Value,
    pub bytecode: String,
}

impl CompiledContract {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// ethconnect の deploy ボディ。位置引数をコンストラクタの入力名に対応させる
    pub fn constructor_params(&self, name: &str, args: &[String]) -> Result<serde_json::Value> {
        let inputs = self
            .abi
            .as_array()
            .and_then(|entries| entries.iter().find(|e| e["type"] == "constructor"))
            .and_then(|constructor| constructor["inputs"].as_array())
            .cloned()
            .unwrap_or_default();
        if inputs.len() != args.len() {
            return Err(ProviderError::ConstructorArguments {
                contract: name.to_string(),
                expected: inputs.len(),
                actual: args.len(),
            });
        }

        let params = inputs
            .iter()
            .zip(args)
            .enumerate()
            .map(|(i, (input, arg))| {
                let key = match input["name"].as_str() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => i.to_string(),
                };
                (key, serde_json::Value::String(arg.clone()))
            })
            .collect::<serde_json::Map<_, _>>();
        Ok(serde_json::Value::Object(params))
    }
}

/// `solc --combined-json abi,bin` output
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombinedJson {
    pub contracts: BTreeMap<String, CombinedContract>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombinedContract {
    /// Older solc releases emit the ABI as a JSON encoded string
    #[serde(deserialize_with = "abi_value")]
    pub abi: serde_json::Value,
    pub bin: String,
}

impl CombinedJson {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn names(&self) -> Vec<String> {
        self.contracts.keys().cloned().collect()
    }

    pub fn get(&self, name: &str, file: &Path) -> Result<CompiledContract> {
        let contract = self
            .contracts
            .get(name)
            .ok_or_else(|| ProviderError::ContractNotFound {
                name: name.to_string(),
                file: file.display().to_string(),
            })?;
        Ok(CompiledContract {
            abi: contract.abi.clone(),
            bytecode: contract.bin.clone(),
        })
    }
}

fn abi_value<'de, D>(deserializer: D) -> std::result::Result<serde_json::Value, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(encoded) => {
            serde_json::from_str(&encoded).map_err(serde::de::Error::custom)
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_json_accepts_string_and_array_abi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.json");
        std::fs::write(
            &path,
            r#"{"contracts": {
                "simple.sol:Simple": {"abi": "[{\"type\":\"constructor\"}]", "bin": "6080"},
                "other.sol:Other": {"abi": [{"type": "fallback"}], "bin": "6060"}
            }}"#,
        )
        .unwrap();

        let combined = CombinedJson::read(&path).unwrap();
        assert_eq!(combined.names(), vec!["other.sol:Other", "simple.sol:Simple"]);

        let simple = combined.get("simple.sol:Simple", &path).unwrap();
        assert_eq!(simple.abi[0]["type"], "constructor");
        assert_eq!(simple.bytecode, "6080");
    }

    #[test]
    fn test_constructor_params_follow_abi_inputs() {
        let contract = CompiledContract {
            abi: serde_json::json!([
                {"type": "function", "name": "set", "inputs": [{"name": "x"}]},
                {"type": "constructor", "inputs": [
                    {"name": "initialSupply", "type": "uint256"},
                    {"name": "", "type": "string"}
                ]}
            ]),
            bytecode: "6080".to_string(),
        };

        let params = contract
            .constructor_params("Token", &["100".to_string(), "TKN".to_string()])
            .unwrap();
        assert_eq!(params, serde_json::json!({"initialSupply": "100", "1": "TKN"}));

        let err = contract
            .constructor_params("Token", &["100".to_string()])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "contract 'Token' constructor takes 2 arguments but 1 were given"
        );
    }

    #[test]
    fn test_no_constructor_takes_no_arguments() {
        let contract = CompiledContract {
            abi: serde_json::json!([{"type": "fallback"}]),
            bytecode: "6080".to_string(),
        };
        assert_eq!(
            contract.constructor_params("Simple", &[]).unwrap(),
            serde_json::json!({})
        );
        assert!(contract.constructor_params("Simple", &["1".to_string()]).is_err());
    }

    #[test]
    fn test_missing_contract_names_file() {
        let combined = CombinedJson {
            contracts: BTreeMap::new(),
        };
        let err = combined.get("Nope", Path::new("/tmp/c.json")).unwrap_err();
        assert_eq!(err.to_string(), "contract 'Nope' not found in /tmp/c.json");
    }
}
