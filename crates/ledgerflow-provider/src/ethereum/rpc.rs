//! Minimal Ethereum JSON-RPC client

use crate::error::{ProviderError, Result};
use ledgerflow_container::http_json;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
}

impl RpcClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 0,
            method,
            params,
        };
        let response: RpcResponse =
            http_json(&self.http, Method::POST, &self.url, Some(&request)).await?;
        if let Some(error) = response.error {
            return Err(ProviderError::Rpc {
                method: method.to_string(),
                message: error.message,
            });
        }
        Ok(response.result)
    }

    /// `personal_unlockAccount` with no expiry
    pub async fn unlock_account(&self, address: &str, password: &str) -> Result<()> {
        self.call(
            "personal_unlockAccount",
            serde_json::json!([address, password, 0]),
        )
        .await?;
        Ok(())
    }
}

/// Unlock every member account, retrying while the node comes up
pub async fn unlock_accounts(
    client: &RpcClient,
    accounts: &[(String, String)],
    password: &str,
    retries: u32,
    period: Duration,
) -> Result<()> {
    for (member, address) in accounts {
        let mut attempt = 0;
        loop {
            match client.unlock_account(address, password).await {
                Ok(()) => {
                    tracing::info!("Unlocked account {} for member {}", address, member);
                    break;
                }
                Err(e) if attempt + 1 < retries => {
                    attempt += 1;
                    tracing::debug!("unlock {} failed ({}), retry {}/{}", address, e, attempt, retries);
                    tokio::time::sleep(period).await;
                }
                Err(e) => {
                    tracing::debug!("unlock {} failed: {}", address, e);
                    return Err(ProviderError::UnlockFailed {
                        address: address.clone(),
                        member: member.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    fn ok(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn test_unlock_succeeds() {
        let url = serve(vec![ok(r#"{"jsonrpc":"2.0","id":0,"result":true}"#)]).await;
        let client = RpcClient::new(reqwest::Client::new(), url);
        client.unlock_account("0xabc", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_rpc_error_is_reported() {
        let url = serve(vec![ok(
            r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32000,"message":"no key for given address"}}"#,
        )])
        .await;
        let client = RpcClient::new(reqwest::Client::new(), url);
        let err = client.unlock_account("0xabc", "pw").await.unwrap_err();
        assert!(err.to_string().contains("no key for given address"));
    }

    #[tokio::test]
    async fn test_unlock_accounts_gives_up_with_member_context() {
        let url = serve(vec![
            ok(r#"{"jsonrpc":"2.0","id":0,"error":{"code":-1,"message":"starting"}}"#),
            ok(r#"{"jsonrpc":"2.0","id":0,"error":{"code":-1,"message":"starting"}}"#),
        ])
        .await;
        let client = RpcClient::new(reqwest::Client::new(), url);
        let accounts = vec![("0".to_string(), "0xabc".to_string())];

        let err = unlock_accounts(&client, &accounts, "pw", 2, Duration::from_millis(5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unable to unlock account 0xabc for member 0");
    }
}
