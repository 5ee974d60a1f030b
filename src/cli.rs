use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pic-witness")]
#[command(about = "写真をIPFSに保存し、ハッシュをブロックチェーンに記録する", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ネットワークを使わずプロセス内の台帳・ストレージで実行
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を追加（IPFSに保存して台帳に記録）
    Add {
        /// 画像ファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 追加後に設定する説明文
        #[arg(short, long)]
        description: Option<String>,
    },

    /// 写真一覧を表示
    List {
        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 写真の説明文を設定
    Describe {
        /// コンテンツID
        #[arg(required = true)]
        content_id: String,

        /// 説明文（省略時は対話入力）
        text: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 署名アカウントを設定
        #[arg(long)]
        set_account: Option<String>,

        /// 台帳ゲートウェイのURLを設定
        #[arg(long)]
        set_ledger_url: Option<String>,

        /// IPFS APIのURLを設定
        #[arg(long)]
        set_ipfs_api_url: Option<String>,

        /// 画像表示用ゲートウェイを設定
        #[arg(long)]
        set_gateway: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
