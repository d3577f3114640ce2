//! First-time setup steps and progress reporting
//!
//! The manager reports each step to a [`SetupObserver`]. The CLI renders
//! them as timestamped lines; library callers can ignore them.

use std::fmt;
use std::time::Duration;

/// The steps of a stack's first start, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    /// `init/` を `runtime/` にコピー
    CopyRuntime,
    /// core コンテナの entrypoint を無効化
    DisableCore,
    /// ブロックチェーンノードの初期化
    InitBlockchain,
    /// prometheus.yml をボリュームへ
    CopyPrometheusConfig,
    /// data exchange の証明書と設定をボリュームへ
    CopyDataExchangeConfig,
    /// 依存サービスの起動
    StartDependencies,
    /// トークンコントラクトのデプロイ
    DeployTokenContracts,
    /// FireFly コントラクトのデプロイ
    DeployFireflyContract,
    /// core 設定をコンテナへ渡し entrypoint を戻す
    ConfigureCore,
    /// core コンテナの起動
    StartCore,
    /// 外部プロセスの起動待ち
    WaitExternalMembers,
    /// org / node の登録
    RegisterIdentities,
    /// トークンコネクタの初期化
    InitTokens,
}

impl SetupStep {
    pub const ALL: [SetupStep; 13] = [
        Self::CopyRuntime,
        Self::DisableCore,
        Self::InitBlockchain,
        Self::CopyPrometheusConfig,
        Self::CopyDataExchangeConfig,
        Self::StartDependencies,
        Self::DeployTokenContracts,
        Self::DeployFireflyContract,
        Self::ConfigureCore,
        Self::StartCore,
        Self::WaitExternalMembers,
        Self::RegisterIdentities,
        Self::InitTokens,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CopyRuntime => "preparing runtime directory",
            Self::DisableCore => "holding core containers",
            Self::InitBlockchain => "initializing blockchain node",
            Self::CopyPrometheusConfig => "copying prometheus config",
            Self::CopyDataExchangeConfig => "copying data exchange config",
            Self::StartDependencies => "starting dependencies",
            Self::DeployTokenContracts => "deploying token contracts",
            Self::DeployFireflyContract => "deploying FireFly contract",
            Self::ConfigureCore => "configuring core nodes",
            Self::StartCore => "starting core nodes",
            Self::WaitExternalMembers => "waiting for external core processes",
            Self::RegisterIdentities => "registering FireFly identities",
            Self::InitTokens => "initializing token providers",
        }
    }

    /// 1-based position in the sequence
    pub fn number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|step| step == self)
            .map_or(0, |i| i + 1)
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives progress of a first-time setup
pub trait SetupObserver: Send + Sync {
    fn step_started(&self, _step: SetupStep) {}

    fn step_succeeded(&self, _step: SetupStep, _elapsed: Duration) {}

    fn step_failed(&self, _step: SetupStep, _error: &str, _elapsed: Duration) {}

    /// Something the operator has to act on, such as starting an external core
    fn notice(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Observer that only logs through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SetupObserver for LogObserver {
    fn step_started(&self, step: SetupStep) {
        tracing::info!("[{}/{}] {}", step.number(), SetupStep::ALL.len(), step);
    }

    fn step_failed(&self, step: SetupStep, error: &str, _elapsed: Duration) {
        tracing::warn!("{} failed: {}", step, error);
    }
}
