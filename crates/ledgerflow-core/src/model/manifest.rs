//! Version manifest: the image reference used for each subsystem

use serde::{Deserialize, Serialize};

/// One image entry of a release manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Built locally, never pulled
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local: bool,
}

impl ManifestEntry {
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
            sha: None,
            local: false,
        }
    }

    /// `image@sha256:<digest>` when pinned, `image:tag` otherwise
    pub fn image_ref(&self) -> String {
        match self.sha.as_deref() {
            Some(sha) if !sha.is_empty() => format!("{}@sha256:{}", self.image, sha),
            _ if self.tag.is_empty() => self.image.clone(),
            _ => format!("{}:{}", self.image, self.tag),
        }
    }
}

/// Image references per subsystem for one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    pub firefly: ManifestEntry,
    pub ethconnect: ManifestEntry,
    pub fabconnect: ManifestEntry,
    #[serde(rename = "dataexchange-https", alias = "dataexchange")]
    pub dataexchange: ManifestEntry,
    #[serde(rename = "tokens-erc1155", alias = "tokens_erc1155")]
    pub tokens_erc1155: ManifestEntry,
    #[serde(rename = "tokens-erc20-erc721", alias = "tokens_erc20_erc721")]
    pub tokens_erc20_erc721: ManifestEntry,
}

impl Default for VersionManifest {
    fn default() -> Self {
        Self {
            firefly: ManifestEntry::new("ghcr.io/hyperledger/firefly", "latest"),
            ethconnect: ManifestEntry::new("ghcr.io/hyperledger/firefly-ethconnect", "latest"),
            fabconnect: ManifestEntry::new("ghcr.io/hyperledger/firefly-fabconnect", "latest"),
            dataexchange: ManifestEntry::new(
                "ghcr.io/hyperledger/firefly-dataexchange-https",
                "latest",
            ),
            tokens_erc1155: ManifestEntry::new("ghcr.io/hyperledger/firefly-tokens-erc1155", "latest"),
            tokens_erc20_erc721: ManifestEntry::new(
                "ghcr.io/hyperledger/firefly-tokens-erc20-erc721",
                "latest",
            ),
        }
    }
}

impl VersionManifest {
    /// Parse a release manifest. Release manifests do not list the core
    /// image, so it is pinned to `release_tag` when missing.
    pub fn from_release_json(json: &str, release_tag: &str) -> serde_json::Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(object) = value.as_object_mut() {
            object.entry("firefly").or_insert_with(|| {
                serde_json::json!({ "image": "ghcr.io/hyperledger/firefly", "tag": release_tag })
            });
        }
        serde_json::from_value(value)
    }

    pub fn entries(&self) -> [&ManifestEntry; 6] {
        [
            &self.firefly,
            &self.ethconnect,
            &self.fabconnect,
            &self.dataexchange,
            &self.tokens_erc1155,
            &self.tokens_erc20_erc721,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_prefers_digest() {
        let mut entry = ManifestEntry::new("ghcr.io/hyperledger/firefly", "v1.0.0");
        assert_eq!(entry.image_ref(), "ghcr.io/hyperledger/firefly:v1.0.0");

        entry.sha = Some("abc123".to_string());
        assert_eq!(entry.image_ref(), "ghcr.io/hyperledger/firefly@sha256:abc123");
    }

    #[test]
    fn test_release_manifest_fills_core_entry() {
        let json = r#"{
            "ethconnect": {"image": "ghcr.io/hyperledger/firefly-ethconnect", "tag": "v3.1.0", "sha": "aa"},
            "fabconnect": {"image": "ghcr.io/hyperledger/firefly-fabconnect", "tag": "v0.9.0"},
            "dataexchange-https": {"image": "ghcr.io/hyperledger/firefly-dataexchange-https", "tag": "v0.10.0"},
            "tokens-erc1155": {"image": "ghcr.io/hyperledger/firefly-tokens-erc1155", "tag": "v0.10.0"},
            "tokens-erc20-erc721": {"image": "ghcr.io/hyperledger/firefly-tokens-erc20-erc721", "tag": "v0.2.0"}
        }"#;

        let manifest = VersionManifest::from_release_json(json, "v1.0.0").unwrap();
        assert_eq!(manifest.firefly.image_ref(), "ghcr.io/hyperledger/firefly:v1.0.0");
        assert_eq!(
            manifest.ethconnect.image_ref(),
            "ghcr.io/hyperledger/firefly-ethconnect@sha256:aa"
        );
    }
}
