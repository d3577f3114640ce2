use crate::utils;
use clap::Args;
use colored::Colorize;
use ledgerflow_config::Settings;
use ledgerflow_core::InitOptions;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// スタック名
    pub name: String,
    /// メンバー数
    #[arg(default_value = "2")]
    pub members: usize,
    /// ブロックチェーンプロバイダ (geth, besu, fabric, remote-rpc)
    #[arg(short, long, env = "LFLOW_BLOCKCHAIN_PROVIDER")]
    pub blockchain_provider: Option<String>,
    /// トークンプロバイダ (erc1155, erc20_erc721)。`none` で無効
    #[arg(short, long, value_delimiter = ',')]
    pub token_providers: Option<Vec<String>>,
    /// データベース (sqlite3, postgres)
    #[arg(short, long, env = "LFLOW_DATABASE")]
    pub database: Option<String>,
    /// メンバーごとのサービスポートの起点
    #[arg(short = 's', long, env = "LFLOW_SERVICES_BASE_PORT")]
    pub services_base_port: Option<u16>,
    /// FireFly API ポートの起点
    #[arg(short = 'p', long, env = "LFLOW_FIREFLY_BASE_PORT")]
    pub firefly_base_port: Option<u16>,
    /// 自前で起動する core の数（先頭のメンバーから）
    #[arg(short, long, default_value = "0")]
    pub external: usize,
    /// 組織名（メンバー順、繰り返し指定）
    #[arg(long = "org-name")]
    pub org_names: Vec<String>,
    /// ノード名（メンバー順、繰り返し指定）
    #[arg(long = "node-name")]
    pub node_names: Vec<String>,
    /// prometheus を有効化
    #[arg(long)]
    pub prometheus_enabled: bool,
    /// prometheus の公開ポート
    #[arg(long, default_value = "9090")]
    pub prometheus_port: u16,
    /// デプロイ済み FireFly コントラクトのアドレス
    #[arg(long)]
    pub contract_address: Option<String>,
    #[arg(long, default_value = "2021")]
    pub chain_id: u64,
    /// remote-rpc の接続先
    #[arg(long, env = "LFLOW_REMOTE_NODE_URL")]
    pub remote_node_url: Option<String>,
    /// ローカルの manifest.json（リリースより優先）
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
    /// 使用するリリース (例: v1.0.0, latest)
    #[arg(short, long)]
    pub release: Option<String>,
    /// 全メンバーの core 設定にマージする YAML
    #[arg(long)]
    pub core_config: Option<PathBuf>,
}

impl InitArgs {
    /// フラグ未指定の値は設定ファイルから
    pub fn to_options(&self, settings: &Settings) -> anyhow::Result<InitOptions> {
        let token_providers = self
            .token_providers
            .clone()
            .unwrap_or_else(|| settings.token_providers.clone())
            .into_iter()
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("none"))
            .collect();
        let database = self
            .database
            .as_deref()
            .unwrap_or(&settings.database)
            .parse()?;

        Ok(InitOptions {
            services_base_port: self.services_base_port.unwrap_or(settings.services_base_port),
            firefly_base_port: self.firefly_base_port.unwrap_or(settings.firefly_base_port),
            database,
            blockchain_provider: self
                .blockchain_provider
                .clone()
                .unwrap_or_else(|| settings.blockchain_provider.clone()),
            token_providers,
            external_processes: self.external,
            org_names: self.org_names.clone(),
            node_names: self.node_names.clone(),
            prometheus_enabled: self.prometheus_enabled,
            prometheus_port: self.prometheus_port,
            contract_address: self.contract_address.clone(),
            chain_id: self.chain_id,
            remote_node_url: self.remote_node_url.clone(),
            manifest_path: self.manifest.clone(),
            release_version: self
                .release
                .clone()
                .unwrap_or_else(|| settings.release.clone()),
            extra_core_config: self.core_config.clone(),
        })
    }
}

pub async fn handle(args: InitArgs, verbose: bool) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let options = args.to_options(&settings)?;
    let manager = utils::stack_manager(verbose)?;

    let pb = utils::spinner(format!("Initializing stack '{}'...", args.name));
    let result = manager.init(&args.name, args.members, &options).await;
    pb.finish_and_clear();
    let stack = result?;

    println!(
        "{}",
        format!("✓ Stack '{}' has been created", stack.name)
            .green()
            .bold()
    );
    println!(
        "  {} members, {} blockchain, database {}",
        stack.members.len(),
        stack.blockchain_provider.cyan(),
        stack.database.to_string().cyan()
    );
    println!();
    println!("To start your new stack run:");
    println!("  {}", format!("lflow start {}", stack.name).cyan());
    Ok(())
}
