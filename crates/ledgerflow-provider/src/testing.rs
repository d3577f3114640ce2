//! Shared fixtures for provider unit tests

use crate::context::{ProviderContext, ProviderTiming};
use async_trait::async_trait;
use ledgerflow_container::{ComposeAction, ContainerRuntime, DockerCommand, Result, RunSpec};
use ledgerflow_core::{
    DatabaseKind, KeyPair, Member, PortExtras, Stack, StackLayout, VersionManifest, allocate,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Records every call as one line, optionally answering `run` with canned stdout
#[derive(Default)]
pub struct RecordingRuntime {
    calls: Mutex<Vec<String>>,
    outputs: Mutex<Vec<(String, String)>>,
}

impl RecordingRuntime {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// `run` calls whose command line contains `needle` print `stdout`
    pub fn respond(&self, needle: &str, stdout: &str) {
        self.outputs
            .lock()
            .unwrap()
            .push((needle.to_string(), stdout.to_string()));
    }

    fn record(&self, line: String) {
        self.calls.lock().unwrap().push(line);
    }
}

#[async_trait]
impl ContainerRuntime for RecordingRuntime {
    async fn compose(&self, _dir: &Path, project: &str, action: ComposeAction) -> Result<String> {
        self.record(format!("compose {project} {action:?}"));
        Ok(String::new())
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        let line = DockerCommand::run(spec).display();
        self.record(line.clone());
        let outputs = self.outputs.lock().unwrap();
        Ok(outputs
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default())
    }

    async fn create_volume(&self, name: &str) -> Result<()> {
        self.record(format!("create_volume {name}"));
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.record(format!("remove_volume {name}"));
        Ok(())
    }

    async fn copy_to_volume(&self, volume: &str, source: &Path, dest: &str) -> Result<()> {
        self.record(format!("copy_to_volume {volume} {} {dest}", source.display()));
        Ok(())
    }

    async fn mkdir_in_volume(&self, volume: &str, dir: &str) -> Result<()> {
        self.record(format!("mkdir_in_volume {volume} {dir}"));
        Ok(())
    }

    async fn copy_from_container(&self, container: &str, source: &str, dest: &Path) -> Result<()> {
        self.record(format!("copy_from_container {container}:{source} {}", dest.display()));
        Ok(())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        self.record(format!("pull {image}"));
        Ok(())
    }
}

pub fn stack(provider: &str, members: usize) -> Stack {
    let extras = PortExtras {
        metrics: false,
        token_count: 1,
    };
    Stack {
        name: "demo".to_string(),
        members: (0..members)
            .map(|index| {
                let keys = KeyPair::generate();
                Member {
                    id: index.to_string(),
                    index,
                    address: keys.address,
                    private_key: Some(keys.private_key),
                    org_name: format!("org_{index}"),
                    node_name: format!("node_{index}"),
                    external: false,
                    ports: allocate(5100, 5000, index, extras),
                }
            })
            .collect(),
        swarm_key: String::new(),
        exposed_blockchain_port: 5100,
        database: DatabaseKind::Sqlite3,
        blockchain_provider: provider.to_string(),
        token_providers: vec![],
        contract_address: None,
        chain_id: 2021,
        remote_node_url: None,
        prometheus_enabled: false,
        exposed_prometheus_port: None,
        version_manifest: VersionManifest::default(),
        created_at: chrono::Utc::now(),
        deployed_contracts: vec![],
    }
}

pub fn layout() -> (tempfile::TempDir, StackLayout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = StackLayout::new(dir.path(), "demo");
    (dir, layout)
}

pub fn context(stack: Stack, layout: StackLayout) -> (ProviderContext, Arc<RecordingRuntime>) {
    let runtime = Arc::new(RecordingRuntime::default());
    let ctx = ProviderContext::new(Arc::new(stack), layout, runtime.clone())
        .with_timing(ProviderTiming::immediate());
    (ctx, runtime)
}

/// Minimal HTTP server answering `(request line prefix, json body)` routes
/// with 200 and recording every full request
pub async fn fake_http(routes: Vec<(&'static str, &'static str)>) -> (u16, Arc<Mutex<Vec<String>>>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut data = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buf[..n]);
                if request_complete(&data) {
                    break;
                }
            }
            let request = String::from_utf8_lossy(&data).to_string();
            log.lock().unwrap().push(request.clone());

            let body = routes
                .iter()
                .find(|(prefix, _)| request.starts_with(prefix))
                .map(|(_, body)| *body)
                .unwrap_or("{}");
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });
    (port, seen)
}

fn request_complete(data: &[u8]) -> bool {
    let text = String::from_utf8_lossy(data);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let headers = &text[..header_end];
    if headers.to_ascii_lowercase().contains("transfer-encoding: chunked") {
        return text.ends_with("0\r\n\r\n");
    }
    let length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    data.len() >= header_end + 4 + length
}
