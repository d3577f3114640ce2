use async_trait::async_trait;
use ledgerflow_container::{ComposeAction, ContainerRuntime, DockerCommand, RunSpec};
use ledgerflow_core::{InitOptions, VersionManifest};
use ledgerflow_stack::credentials::{CERT_FILE, KEY_FILE};
use ledgerflow_stack::{
    CredentialGenerator, StackManager, StackRepository, StaticManifest, Timing,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Container engine that only records what it was asked to do
#[derive(Default)]
pub struct FakeRuntime {
    calls: Mutex<Vec<String>>,
    /// Ports a fake core API starts listening on at the next `compose up`
    core_ports: Mutex<Vec<u16>>,
    core: FakeCore,
}

impl FakeRuntime {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, line: String) {
        self.calls.lock().unwrap().push(line);
    }

    /// Bring up a core API on `ports` the next time compose starts containers
    pub fn serve_core_on_up(&self, ports: Vec<u16>) {
        *self.core_ports.lock().unwrap() = ports;
    }

    pub fn core(&self) -> &FakeCore {
        &self.core
    }
}

/// Answers the core's network registration API for every org in `orgs`
#[derive(Default, Clone)]
pub struct FakeCore {
    orgs: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeCore {
    pub fn with_orgs(&self, orgs: &[&str]) {
        *self.orgs.lock().unwrap() = orgs.iter().map(|o| o.to_string()).collect();
    }

    /// Request lines such as `POST /api/v1/network/register/node HTTP/1.1`, with the port
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    async fn listen(&self, port: u16) {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let core = self.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let request = read_request(&mut socket).await;
                let line = request.lines().next().unwrap_or("").to_string();
                if line.is_empty() {
                    // availability check that connects and closes
                    continue;
                }
                core.requests.lock().unwrap().push(format!("{port} {line}"));

                let body = if line.starts_with("GET /api/v1/network/organizations") {
                    let orgs: Vec<_> = core
                        .orgs
                        .lock()
                        .unwrap()
                        .iter()
                        .map(|name| serde_json::json!({ "name": name }))
                        .collect();
                    serde_json::Value::Array(orgs).to_string()
                } else {
                    "{}".to_string()
                };
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn compose(
        &self,
        dir: &Path,
        project: &str,
        action: ComposeAction,
    ) -> ledgerflow_container::Result<String> {
        let dir = dir.file_name().unwrap().to_string_lossy().to_string();
        self.record(format!("compose {project} {action:?} ({dir})"));
        if action == ComposeAction::Up {
            let ports = std::mem::take(&mut *self.core_ports.lock().unwrap());
            for port in ports {
                self.core.listen(port).await;
            }
        }
        Ok(String::new())
    }

    async fn run(&self, spec: &RunSpec) -> ledgerflow_container::Result<String> {
        self.record(DockerCommand::run(spec).display());
        Ok(String::new())
    }

    async fn create_volume(&self, name: &str) -> ledgerflow_container::Result<()> {
        self.record(format!("create_volume {name}"));
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> ledgerflow_container::Result<()> {
        self.record(format!("remove_volume {name}"));
        Ok(())
    }

    async fn copy_to_volume(
        &self,
        volume: &str,
        _source: &Path,
        dest: &str,
    ) -> ledgerflow_container::Result<()> {
        self.record(format!("copy_to_volume {volume} {dest}"));
        Ok(())
    }

    async fn mkdir_in_volume(&self, volume: &str, dir: &str) -> ledgerflow_container::Result<()> {
        self.record(format!("mkdir_in_volume {volume} {dir}"));
        Ok(())
    }

    async fn copy_from_container(
        &self,
        container: &str,
        source: &str,
        _dest: &Path,
    ) -> ledgerflow_container::Result<()> {
        self.record(format!("copy_from_container {container}:{source}"));
        Ok(())
    }

    async fn pull(&self, image: &str) -> ledgerflow_container::Result<()> {
        self.record(format!("pull {image}"));
        Ok(())
    }
}

/// Writes placeholder PEM files instead of calling openssl
pub struct FakeCredentials;

#[async_trait]
impl CredentialGenerator for FakeCredentials {
    async fn self_signed(&self, dir: &Path, member_id: &str) -> ledgerflow_stack::Result<()> {
        std::fs::write(dir.join(CERT_FILE), format!("cert {member_id}"))?;
        std::fs::write(dir.join(KEY_FILE), format!("key {member_id}"))?;
        Ok(())
    }
}

pub struct TestEnv {
    pub root: TempDir,
    pub runtime: Arc<FakeRuntime>,
    pub manager: StackManager,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let runtime = Arc::new(FakeRuntime::default());
        let manager = StackManager::new(StackRepository::new(root.path()), runtime.clone())
            .with_credentials(Arc::new(FakeCredentials))
            .with_manifest_source(Arc::new(StaticManifest(VersionManifest::default())))
            .with_timing(Timing::immediate());
        Self {
            root,
            runtime,
            manager,
        }
    }

    pub fn stack_dir(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }
}

/// Every file under `dir` with its content, keyed by relative path
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, files);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_path_buf();
                files.insert(relative, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut files = BTreeMap::new();
    walk(dir, dir, &mut files);
    files
}

/// Options on a port range no other test uses
pub fn options(services_base_port: u16, firefly_base_port: u16) -> InitOptions {
    InitOptions {
        services_base_port,
        firefly_base_port,
        ..Default::default()
    }
}
