//! Version manifest resolution
//!
//! A stack pins its images when it is created, either from a local
//! `manifest.json` or from a published release.

use crate::error::{Result, StackError};
use async_trait::async_trait;
use ledgerflow_core::{InitOptions, ManifestEntry, VersionManifest};
use serde::Deserialize;
use std::path::Path;

const GITHUB_API: &str = "https://api.github.com/repos/hyperledger/firefly";
const GITHUB_RAW: &str = "https://raw.githubusercontent.com/hyperledger/firefly";
const LOCAL_CORE_IMAGE: &str = "hyperledger/firefly";

/// Where release manifests come from
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Manifest of `version`, where `latest` means the newest release
    async fn release_manifest(&self, version: &str) -> Result<VersionManifest>;
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Release manifests published on GitHub
#[derive(Debug, Clone)]
pub struct GithubReleases {
    client: reqwest::Client,
    api_base: String,
    raw_base: String,
}

impl Default for GithubReleases {
    fn default() -> Self {
        Self::new(GITHUB_API, GITHUB_RAW)
    }
}

impl GithubReleases {
    pub fn new(api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            raw_base: raw_base.into(),
        }
    }

    async fn latest_tag(&self) -> Result<String> {
        let url = format!("{}/releases/latest", self.api_base);
        tracing::debug!("GET {}", url);
        let release: Release = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, "ledgerflow")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(release.tag_name)
    }
}

#[async_trait]
impl ManifestSource for GithubReleases {
    async fn release_manifest(&self, version: &str) -> Result<VersionManifest> {
        let tag = if version.is_empty() || version.eq_ignore_ascii_case("latest") {
            self.latest_tag().await?
        } else {
            release_tag(version)
        };
        let url = format!("{}/{}/manifest.json", self.raw_base, tag);
        tracing::info!("Fetching version manifest {}", url);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        VersionManifest::from_release_json(&body, &tag)
            .map_err(|e| StackError::Manifest(format!("{url}: {e}")))
    }
}

/// `1.0.0` and `v1.0.0` both name the `v1.0.0` tag
pub fn release_tag(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Read a manifest from disk. A manifest without a core entry belongs to a
/// source checkout, whose core image is built locally.
pub fn read_manifest_file(path: &Path) -> Result<VersionManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        StackError::Manifest(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| StackError::Manifest(format!("{}: {e}", path.display())))?;
    if let Some(object) = value.as_object_mut() {
        object.entry("firefly").or_insert(serde_json::to_value(ManifestEntry {
            local: true,
            ..ManifestEntry::new(LOCAL_CORE_IMAGE, "latest")
        })?);
    }
    serde_json::from_value(value)
        .map_err(|e| StackError::Manifest(format!("{}: {e}", path.display())))
}

/// Manifest for a new stack: the local file when given, else the release
pub async fn resolve(source: &dyn ManifestSource, options: &InitOptions) -> Result<VersionManifest> {
    match &options.manifest_path {
        Some(path) => read_manifest_file(path),
        None => source.release_manifest(&options.release_version).await,
    }
}

/// Serves one fixed manifest
#[derive(Debug, Clone, Default)]
pub struct StaticManifest(pub VersionManifest);

#[async_trait]
impl ManifestSource for StaticManifest {
    async fn release_manifest(&self, _version: &str) -> Result<VersionManifest> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const MANIFEST: &str = r#"{
        "ethconnect": {"image": "ghcr.io/hyperledger/firefly-ethconnect", "tag": "v3.1.0"},
        "fabconnect": {"image": "ghcr.io/hyperledger/firefly-fabconnect", "tag": "v0.9.0"},
        "dataexchange-https": {"image": "ghcr.io/hyperledger/firefly-dataexchange-https", "tag": "v0.10.0"},
        "tokens-erc1155": {"image": "ghcr.io/hyperledger/firefly-tokens-erc1155", "tag": "v0.10.0"},
        "tokens-erc20-erc721": {"image": "ghcr.io/hyperledger/firefly-tokens-erc20-erc721", "tag": "v0.2.0"}
    }"#;

    /// Answer each connection with the body chosen by the request path
    async fn serve(routes: Vec<(&'static str, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
                let response = match routes.iter().find(|(p, _)| *p == path) {
                    Some((_, body)) => format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    ),
                    None => "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                        .to_string(),
                };
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_latest_resolves_tag_then_manifest() {
        let base = serve(vec![
            ("/releases/latest", r#"{"tag_name":"v1.0.2"}"#.to_string()),
            ("/v1.0.2/manifest.json", MANIFEST.to_string()),
        ])
        .await;
        let source = GithubReleases::new(base.clone(), base);

        let manifest = source.release_manifest("latest").await.unwrap();
        assert_eq!(manifest.firefly.image_ref(), "ghcr.io/hyperledger/firefly:v1.0.2");
        assert_eq!(manifest.fabconnect.tag, "v0.9.0");
    }

    #[tokio::test]
    async fn test_missing_release_is_an_error() {
        let base = serve(vec![]).await;
        let source = GithubReleases::new(base.clone(), base);
        assert!(source.release_manifest("0.0.1").await.is_err());
    }

    #[test]
    fn test_release_tag() {
        assert_eq!(release_tag("1.0.0"), "v1.0.0");
        assert_eq!(release_tag("v1.0.0"), "v1.0.0");
    }

    #[test]
    fn test_manifest_file_marks_core_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = read_manifest_file(&path).unwrap();
        assert!(manifest.firefly.local);
        assert_eq!(manifest.firefly.image_ref(), "hyperledger/firefly:latest");
        assert!(!manifest.ethconnect.local);
    }

    #[test]
    fn test_unreadable_manifest_file() {
        let err = read_manifest_file(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, StackError::Manifest(_)));
    }
}
