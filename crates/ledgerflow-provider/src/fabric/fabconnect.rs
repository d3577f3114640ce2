//! fabconnect: per-member REST gateway to the Fabric network

use super::network::SHARED_VOLUME;
use crate::error::Result;
use ledgerflow_container::{DependsOn, HealthCheck, Service, ServiceDefinition, http_json};
use ledgerflow_core::{Member, Stack, StackLayout};
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const PORT: u16 = 3000;
const CONFIG: &str = include_str!("templates/fabconnect.yaml");

pub fn service_name(member: &Member) -> String {
    format!("fabconnect_{}", member.id)
}

pub fn write_config(layout: &StackLayout) -> Result<()> {
    let dir = layout.init_blockchain_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("fabconnect.yaml"), CONFIG)?;
    Ok(())
}

/// One gateway per member, bind mounting the runtime connection profile
pub fn service_definitions(stack: &Stack, layout: &StackLayout) -> Vec<ServiceDefinition> {
    let blockchain_dir = layout.runtime_blockchain_dir();
    let config = blockchain_dir.join("fabconnect.yaml");
    let ccp = blockchain_dir.join("ccp.yaml");

    stack
        .members
        .iter()
        .map(|member| {
            let name = service_name(member);
            let receipts = format!("fabconnect_receipts_{}", member.id);
            let events = format!("fabconnect_events_{}", member.id);

            let service = Service::new(stack.version_manifest.fabconnect.image_ref())
                .container_name(stack.container_name(&name))
                .command("-f /fabconnect/fabconnect.yaml")
                .depends_on("fabric_ca", DependsOn::started())
                .depends_on("fabric_peer", DependsOn::started())
                .depends_on("fabric_orderer", DependsOn::started())
                .port(member.ports.connector, PORT)
                .volume(format!("{receipts}:/fabconnect/receipts"))
                .volume(format!("{events}:/fabconnect/events"))
                .volume(format!("{}:/fabconnect/fabconnect.yaml", config.display()))
                .volume(format!("{}:/fabconnect/ccp.yaml", ccp.display()))
                .volume(format!("{SHARED_VOLUME}:/etc/firefly"))
                .healthcheck(HealthCheck::new([
                    "CMD",
                    "wget",
                    "-O",
                    "-",
                    "http://localhost:3000/status",
                ]));

            ServiceDefinition {
                service_name: name,
                service,
                volume_names: vec![receipts, events, SHARED_VOLUME.to_string()],
            }
        })
        .collect()
}

pub fn member_url(member: &Member) -> String {
    if member.external {
        host_url(member)
    } else {
        format!("http://{}:{}", service_name(member), PORT)
    }
}

pub fn host_url(member: &Member) -> String {
    format!("http://127.0.0.1:{}", member.ports.connector)
}

#[derive(Debug, Serialize)]
struct CreateIdentityRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateIdentityResponse {
    pub name: String,
    pub secret: String,
}

#[derive(Debug, Serialize)]
struct EnrollRequest<'a> {
    secret: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct EnrollResponse {
    pub name: String,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct FabconnectClient {
    http: reqwest::Client,
    base_url: String,
}

impl FabconnectClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn create_identity(&self, name: &str) -> Result<CreateIdentityResponse> {
        let url = format!("{}/identities", self.base_url);
        let body = CreateIdentityRequest { name, kind: "client" };
        Ok(http_json(&self.http, Method::POST, &url, Some(&body)).await?)
    }

    pub async fn enroll_identity(&self, name: &str, secret: &str) -> Result<EnrollResponse> {
        let url = format!("{}/identities/{}/enroll", self.base_url, name);
        let body = EnrollRequest { secret };
        Ok(http_json(&self.http, Method::POST, &url, Some(&body)).await?)
    }

    /// Create then enroll `name` with the org CA
    pub async fn register_identity(&self, name: &str) -> Result<()> {
        let created = self.create_identity(name).await?;
        self.enroll_identity(name, &created.secret).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_service_definitions() {
        let (_dir, layout) = testing::layout();
        let stack = testing::stack("fabric", 2);
        let definitions = service_definitions(&stack, &layout);

        assert_eq!(definitions.len(), 2);
        let second = &definitions[1];
        assert_eq!(second.service_name, "fabconnect_1");
        assert_eq!(second.service.ports, vec!["5202:3000"]);
        assert_eq!(second.service.depends_on["fabric_peer"], DependsOn::started());
        assert!(second.service.healthcheck.is_some());
        assert!(
            second
                .service
                .volumes
                .iter()
                .any(|v| v.ends_with("runtime/blockchain/ccp.yaml:/fabconnect/ccp.yaml"))
        );
    }

    /// Read one request, headers and body
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| l.to_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    #[tokio::test]
    async fn test_register_identity_creates_then_enrolls() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut requests = Vec::new();
            for body in [r#"{"name":"org_0","secret":"s3cret"}"#, r#"{"name":"org_0","success":true}"#] {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        let client = FabconnectClient::new(reqwest::Client::new(), format!("http://{addr}"));
        client.register_identity("org_0").await.unwrap();

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /identities HTTP/1.1"));
        assert!(requests[1].starts_with("POST /identities/org_0/enroll HTTP/1.1"));
        assert!(requests[1].contains("s3cret"));
    }
}
