use anyhow::Context;
use clap::Parser;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use pic_witness::common::{ContentId, ResolutionGap, ViewState, render_items};
use pic_witness::error::PicWitnessError;
use pic_witness::{app, cli, config};
use cli::{Cli, Commands};
use config::Config;
use serde::Serialize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOutput<'a> {
    item_count: u64,
    items: Vec<pic_witness::common::ItemView>,
    gaps: &'a [ResolutionGap],
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "pic_witness=debug"
    } else {
        "pic_witness=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_view(view: &ViewState, gateway_base: &str) {
    println!("あなたの写真: {}枚", view.item_count);

    for item in render_items(view, gateway_base) {
        println!("---");
        let description = if item.description.is_empty() {
            "(説明なし)"
        } else {
            item.description.as_str()
        };
        println!("  {}", description);
        println!("  追加日: {}", item.added_on);
        println!("  ID: {}", item.content_id);
        println!("  画像: {}", item.image_url);
    }

    for gap in &view.gaps {
        println!("---");
        println!("  ⚠ #{} を取得できませんでした: {}", gap.index, gap.reason);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Add { file, description } => {
            println!("📷 pic-witness - 写真の追加\n");

            let mut controller = app::connect(&config, cli.dry_run)?;

            let pb = spinner("台帳を読み込み中...");
            let loaded = app::initial_load(&mut controller).await;
            pb.finish_and_clear();
            loaded?;

            controller.select_file(&file).await?;
            println!("✔ 画像を選択: {}", file.display());

            let pb = spinner("IPFSに保存して台帳に記録中...");
            let uploaded = controller.submit_upload().await;
            pb.finish_and_clear();

            let outcome = match uploaded {
                Ok(outcome) => outcome,
                Err(PicWitnessError::OrphanedContent { content_id, cause }) => {
                    println!("✗ 台帳への記録に失敗しました: {}", cause);
                    println!("  IPFS上のデータ ({}) はどこからも参照されません", content_id);
                    return Err(PicWitnessError::OrphanedContent { content_id, cause }.into());
                }
                Err(e) => return Err(e.into()),
            };
            println!("✔ IPFSに保存: {}", outcome.content_id);
            println!("✔ 台帳に記録: {}", outcome.receipt.transaction_hash);

            if let Some(text) = description {
                let receipt = controller.submit_description(&outcome.content_id, &text).await?;
                println!("✔ 説明文を記録: {}", receipt.transaction_hash);
            }

            println!();
            print_view(controller.view(), &config.gateway_base);
        }

        Commands::List { json } => {
            let mut controller = app::connect(&config, cli.dry_run)?;

            let pb = spinner("台帳を読み込み中...");
            let loaded = app::initial_load(&mut controller).await;
            pb.finish_and_clear();
            loaded?;

            let view = controller.view();
            if json {
                let output = ListOutput {
                    item_count: view.item_count,
                    items: render_items(view, &config.gateway_base),
                    gaps: &view.gaps,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_view(view, &config.gateway_base);
            }
        }

        Commands::Describe { content_id, text } => {
            let content_id: ContentId = content_id.parse()?;
            let mut controller = app::connect(&config, cli.dry_run)?;
            app::initial_load(&mut controller).await?;

            match controller.view().find(&content_id) {
                Some(item) => println!("現在の説明文: {}", item.description),
                None => println!("⚠ 一覧にない写真です: {}", content_id),
            }

            let text = match text {
                Some(text) => text,
                None => Input::<String>::new()
                    .with_prompt("説明文")
                    .interact_text()
                    .context("説明文を入力できません")?,
            };
            controller.set_description_draft(&text);

            let receipt = controller.submit_description_draft(&content_id).await?;
            println!("✔ 説明文を記録: {}", receipt.transaction_hash);
            println!("  一覧への反映は次回の読み込み時になります");
        }

        Commands::Config {
            set_account,
            set_ledger_url,
            set_ipfs_api_url,
            set_gateway,
            show,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(account) = set_account {
                config.set_account(&account)?;
                changed = true;
            }
            if let Some(url) = set_ledger_url {
                config.ledger_url = url;
                changed = true;
            }
            if let Some(url) = set_ipfs_api_url {
                config.ipfs_api_url = url;
                changed = true;
            }
            if let Some(gateway) = set_gateway {
                config.gateway_base = gateway;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  アカウント: {}", config.account.as_deref().unwrap_or("未設定"));
                println!("  台帳: {}", config.ledger_url);
                println!("  IPFS API: {}", config.ipfs_api_url);
                println!("  ゲートウェイ: {}", config.gateway_base);
                println!("  同時取得数: {}", config.max_concurrent_lookups);
                println!("  取得タイムアウト: {}秒", config.lookup_timeout_seconds);
            }
        }
    }

    Ok(())
}
