//! JSON over HTTP
//!
//! Thin helpers around [`reqwest`] used for every control-plane call a stack
//! makes to its nodes and connectors.

use crate::error::{ContainerError, Result};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_RETRIES: u32 = 30;
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(1);

/// Send `body` as JSON and decode the response.
///
/// A non-2xx status is an error carrying the status and the raw body. A
/// `204 No Content` or an empty body decodes from `null`, so callers that do
/// not care about the response can ask for `()` or `serde_json::Value`.
pub async fn http_json<B, R>(client: &Client, method: Method, url: &str, body: Option<&B>) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    tracing::debug!("{} {}", method, url);

    let mut request = client
        .request(method, url)
        .header(reqwest::header::ACCEPT, "application/json");
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ContainerError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    Ok(serde_json::from_str(&text)?)
}

/// [`http_json`] retried a fixed number of times with a fixed period
pub async fn http_json_with_retry<B, R>(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<&B>,
    retries: u32,
    period: Duration,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut attempt = 0;
    loop {
        match http_json(client, method.clone(), url, body).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < retries => {
                attempt += 1;
                tracing::debug!("{} {} failed ({}), retry {}/{}", method, url, e, attempt, retries);
                tokio::time::sleep(period).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned HTTP responses, one per connection
    async fn serve(responses: Vec<&'static str>) -> String {
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

    #[tokio::test]
    async fn test_decodes_success_body() {
        let url = serve(vec![
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 13\r\nconnection: close\r\n\r\n{\"id\":\"abc\"}\n",
        ])
        .await;

        let value: serde_json::Value = http_json(&Client::new(), Method::GET, &url, None::<&()>)
            .await
            .unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[tokio::test]
    async fn test_no_content_skips_decode() {
        let url = serve(vec!["HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n"]).await;
        let body = serde_json::json!({});
        let _: () = http_json(&Client::new(), Method::POST, &url, Some(&body))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let url = serve(vec![
            "HTTP/1.1 409 Conflict\r\ncontent-length: 7\r\nconnection: close\r\n\r\nexists!",
        ])
        .await;

        let err = http_json::<(), serde_json::Value>(&Client::new(), Method::POST, &url, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("{url} returned 409: exists!"));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let url = serve(vec![
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
        ])
        .await;

        let value: serde_json::Value = http_json_with_retry(
            &Client::new(),
            Method::GET,
            &url,
            None::<&()>,
            3,
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert!(value.is_object());
    }
}
