//! Org and node registration against each member's core API

use crate::error::{Result, StackError};
use ledgerflow_container::http_json_with_retry;
use ledgerflow_core::Member;
use reqwest::{Client, Method};
use serde::Deserialize;
use std::time::Duration;

/// Retry budgets of the registration calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationTiming {
    pub http_retries: u32,
    /// Polls of the organizations list before giving up
    pub org_poll_retries: u32,
    pub period: Duration,
}

impl Default for RegistrationTiming {
    fn default() -> Self {
        Self {
            http_retries: ledgerflow_container::http::DEFAULT_RETRIES,
            org_poll_retries: 60,
            period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Organization {
    #[serde(default)]
    name: String,
}

fn api_url(member: &Member) -> String {
    format!("http://127.0.0.1:{}/api/v1", member.ports.firefly)
}

/// Register each member's org, wait for it to be confirmed, then register its node
pub async fn register_identities(
    client: &Client,
    members: &[Member],
    timing: RegistrationTiming,
) -> Result<()> {
    let empty = serde_json::json!({});
    for member in members {
        let api = api_url(member);
        tracing::info!("Registering {} and {}", member.org_name, member.node_name);

        let _: serde_json::Value = http_json_with_retry(
            client,
            Method::POST,
            &format!("{api}/network/register/node/organization"),
            Some(&empty),
            timing.http_retries,
            timing.period,
        )
        .await?;

        wait_for_org(client, &api, member, timing).await?;

        let _: serde_json::Value = http_json_with_retry(
            client,
            Method::POST,
            &format!("{api}/network/register/node"),
            Some(&empty),
            timing.http_retries,
            timing.period,
        )
        .await?;
    }
    Ok(())
}

async fn wait_for_org(
    client: &Client,
    api: &str,
    member: &Member,
    timing: RegistrationTiming,
) -> Result<()> {
    let url = format!("{api}/network/organizations");
    for attempt in 0..=timing.org_poll_retries {
        let orgs: Vec<Organization> = http_json_with_retry(
            client,
            Method::GET,
            &url,
            None::<&()>,
            timing.http_retries,
            timing.period,
        )
        .await?;
        if orgs.iter().any(|o| o.name == member.org_name) {
            return Ok(());
        }
        if attempt < timing.org_poll_retries {
            tokio::time::sleep(timing.period).await;
        }
    }
    Err(StackError::RegistrationTimeout {
        org: member.org_name.clone(),
        node: member.node_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_core::PortSet;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Fake core API. The org list is empty for the first `hidden` polls.
    async fn fake_core(org: &'static str, hidden: usize) -> (u16, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        tokio::spawn(async move {
            let mut polls = 0;
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let line = request.lines().next().unwrap_or("").to_string();
                log.lock().unwrap().push(line.clone());

                let body = if line.starts_with("GET") {
                    polls += 1;
                    if polls > hidden {
                        format!(r#"[{{"id":"1","name":"{org}"}}]"#)
                    } else {
                        "[]".to_string()
                    }
                } else {
                    "{}".to_string()
                };
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

    fn member(port: u16) -> Member {
        Member {
            id: "0".to_string(),
            index: 0,
            address: "0x0000000000000000000000000000000000000001".to_string(),
            private_key: None,
            org_name: "org_0".to_string(),
            node_name: "node_0".to_string(),
            external: false,
            ports: PortSet {
                firefly: port,
                ..Default::default()
            },
        }
    }

    fn timing(org_poll_retries: u32) -> RegistrationTiming {
        RegistrationTiming {
            http_retries: 1,
            org_poll_retries,
            period: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_registers_org_then_node() {
        let (port, seen) = fake_core("org_0", 2).await;
        register_identities(&Client::new(), &[member(port)], timing(5))
            .await
            .unwrap();

        let seen = seen.lock().unwrap().clone();
        assert!(seen[0].starts_with("POST /api/v1/network/register/node/organization"));
        assert_eq!(
            seen.iter().filter(|l| l.starts_with("GET")).count(),
            3
        );
        assert!(seen.last().unwrap().starts_with("POST /api/v1/network/register/node "));
    }

    #[tokio::test]
    async fn test_times_out_when_org_never_appears() {
        let (port, _) = fake_core("someone_else", 0).await;
        let err = register_identities(&Client::new(), &[member(port)], timing(2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "timeout error waiting to register org_0 and node_0");
    }
}
