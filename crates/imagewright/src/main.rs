mod app;
mod commands;
mod observer;
mod requests;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imagewright")]
#[command(about = "Build and tag service images so every requested tag exists", long_about = None)]
struct Cli {
    /// 設定ファイル (省略時は ./imagewright.yaml などを探索)
    #[arg(short, long, global = true, env = "IMAGEWRIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// プロジェクトのルートディレクトリ (設定ファイルの project_root より優先)
    #[arg(short = 'C', long, global = true, env = "IMAGEWRIGHT_PROJECT")]
    project: Option<PathBuf>,

    /// ログを詳細にする (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Requested tags, from flags and/or request files
#[derive(Args, Debug, Default)]
pub struct RequestArgs {
    /// SERVICE:TAG を要求 (複数指定可)
    #[arg(short = 'r', long = "request", value_name = "SERVICE:TAG")]
    pub requests: Vec<String>,

    /// SERVICE:TAG を要求し、既存でも新しくビルドする
    #[arg(short = 'e', long = "enforce", value_name = "SERVICE:TAG")]
    pub enforced: Vec<String>,

    /// 要求を YAML ファイルから読み込む
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 要求されたタグがすべて存在するようにビルド・タグ付けする
    Reconcile {
        #[command(flatten)]
        requests: RequestArgs,
        /// 並列ビルド数 (設定ファイルの max_parallel_builds より優先)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// 結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// 何が行われるかを表示する (レジストリは変更しない)
    Plan {
        #[command(flatten)]
        requests: RequestArgs,
        /// 結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// ローカルのイメージ一覧を表示
    Images {
        /// 表示するリポジトリ
        repository: Option<String>,
        /// 結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// ビルドツールが管理するサービスの一覧を表示
    Services,
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "✗".red().bold(), describe(&err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = app::AppOptions {
        config: cli.config,
        project: cli.project,
    };

    match cli.command {
        Commands::Version => {
            println!("imagewright {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Reconcile {
            requests,
            jobs,
            json,
        } => commands::reconcile::handle(&options, &requests, jobs, json).await,
        Commands::Plan { requests, json } => {
            commands::plan::handle(&options, &requests, json).await
        }
        Commands::Images { repository, json } => {
            commands::images::handle(&options, repository.as_deref(), json).await
        }
        Commands::Services => commands::services::handle(&options).await,
    }
}

/// ライブラリのエラーは user_message() のヒント付きで表示する
fn describe(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<imagewright_build::BuildToolError>() {
        return e.user_message();
    }
    if let Some(e) = err.downcast_ref::<imagewright_core::Error>() {
        return e.user_message();
    }
    format!("{:#}", err)
}
