mod commands;
mod setup;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lflow")]
#[command(about = "Run a multi-member FireFly network on your machine", long_about = None)]
struct Cli {
    /// docker の出力とデバッグログを表示
    #[arg(short, long, global = true, env = "LFLOW_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 新しいスタックを作成
    Init(commands::init::InitArgs),
    /// スタックを起動（初回はセットアップを実行）
    Start {
        /// スタック名
        name: String,
        /// 初回セットアップ失敗時にロールバックしない
        #[arg(long)]
        no_rollback: bool,
    },
    /// スタックを停止
    Stop {
        /// スタック名
        name: String,
    },
    /// スタックのデータを消して初期化直後の状態に戻す
    Reset {
        /// スタック名
        name: String,
        /// 確認しない
        #[arg(short, long)]
        yes: bool,
    },
    /// スタックを完全に削除
    Remove {
        /// スタック名
        name: String,
        /// 確認しない
        #[arg(short, long)]
        yes: bool,
    },
    /// スタックの一覧
    Ls,
    /// スタックが使う全イメージを取得
    Pull {
        /// スタック名
        name: String,
        /// 失敗時の再試行回数
        #[arg(short, long)]
        retries: Option<u32>,
    },
    /// コンテナを停止して全イメージを取り直す
    Upgrade {
        /// スタック名
        name: String,
        /// 失敗時の再試行回数
        #[arg(short, long)]
        retries: Option<u32>,
    },
    /// メンバーのアカウント（アドレスと秘密鍵）を JSON で表示
    Accounts {
        /// スタック名
        name: String,
    },
    /// イメージとコンテナの状態を表示
    Info {
        /// スタック名
        name: String,
    },
    /// スタックのログを表示
    Logs {
        /// スタック名
        name: String,
        /// ログをリアルタイムで追跡
        #[arg(short, long)]
        follow: bool,
    },
    /// カスタムコントラクトをデプロイ
    Deploy {
        /// スタック名
        name: String,
        /// コンパイル済みコントラクト（fabric ではチェーンコードパッケージ）
        file: PathBuf,
        /// fabric: <channel> <chaincode> <version>、ethereum: コンストラクタ引数（ABI の順）
        args: Vec<String>,
        /// ファイル内のコントラクト名
        #[arg(short, long)]
        contract: Option<String>,
        /// デプロイに使うメンバーのインデックス
        #[arg(short, long, default_value = "0")]
        member: usize,
    },
    /// コンパイル済みファイル内のコントラクト名を表示
    Contracts {
        /// スタック名
        name: String,
        /// コンパイル済みコントラクト
        file: PathBuf,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Init(args) => commands::init::handle(args, verbose).await,
        Commands::Start { name, no_rollback } => {
            commands::start::handle(&name, no_rollback, verbose).await
        }
        Commands::Stop { name } => commands::lifecycle::stop(&name, verbose).await,
        Commands::Reset { name, yes } => commands::lifecycle::reset(&name, yes, verbose).await,
        Commands::Remove { name, yes } => commands::lifecycle::remove(&name, yes, verbose).await,
        Commands::Ls => commands::inspect::ls(verbose),
        Commands::Pull { name, retries } => commands::inspect::pull(&name, retries, verbose).await,
        Commands::Upgrade { name, retries } => {
            commands::inspect::upgrade(&name, retries, verbose).await
        }
        Commands::Accounts { name } => commands::inspect::accounts(&name, verbose),
        Commands::Info { name } => commands::inspect::info(&name, verbose).await,
        Commands::Logs { name, follow } => commands::inspect::logs(&name, follow, verbose).await,
        Commands::Deploy {
            name,
            file,
            args,
            contract,
            member,
        } => {
            commands::contract::deploy(&name, &file, contract.as_deref(), member, &args, verbose)
                .await
        }
        Commands::Contracts { name, file } => commands::contract::contracts(&name, &file, verbose),
        Commands::Version => {
            println!("ledgerflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
