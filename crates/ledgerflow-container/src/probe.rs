//! ポート確認とReadiness待機
//!
//! 接続できた = 使用中、拒否/タイムアウト = 空き。
//! 同じ判定を「事前チェック」と「起動待ち」の両方で使う。

use crate::error::{ContainerError, Result};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

/// 1回の接続試行のタイムアウト
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// `127.0.0.1:<port>` が空いているか
pub async fn is_port_available(port: u16) -> bool {
    match timeout(PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await {
        Ok(Ok(_stream)) => false,
        // 接続拒否・タイムアウトはどちらも空きとみなす
        Ok(Err(_)) | Err(_) => true,
    }
}

/// 全ポートが空いていることを確認。最初に見つかった使用中ポートでエラー
pub async fn check_ports_available(ports: &[u16]) -> Result<()> {
    for &port in ports {
        if port == 0 {
            continue;
        }
        if !is_port_available(port).await {
            return Err(ContainerError::PortUnavailable(port));
        }
    }
    Ok(())
}

/// ポートが接続を受け付けるまで待機
///
/// 毎回 `period` 待ってから確認する。`retries` 回で諦めて
/// [`ContainerError::ReadinessTimeout`] を返す。
pub async fn wait_for_port(target: &str, port: u16, retries: u32, period: Duration) -> Result<()> {
    let started = Instant::now();
    for attempt in 1..=retries {
        sleep(period).await;
        if !is_port_available(port).await {
            tracing::debug!("{} is listening on port {} (attempt {})", target, port, attempt);
            return Ok(());
        }
    }

    Err(ContainerError::ReadinessTimeout {
        target: target.to_string(),
        port,
        waited_secs: (period * retries).as_secs(),
        elapsed: started.elapsed(),
    })
}
