//! 組み立て
//!
//! 台帳・ストレージの接続ハンドルはここで一度だけ作り、
//! コントローラに注入する。

use crate::config::Config;
use crate::error::{PicWitnessError, Result};
use crate::ledger::{Ledger, MemoryLedger, RpcLedger};
use crate::storage::{IpfsStorage, MemoryStorage, Storage};
use crate::sync::{CountChange, SyncController, SyncOptions};
use pic_witness_common::Account;
use std::sync::Arc;

/// ドライランでアカウント未設定のときに使う署名者
pub const DRY_RUN_ACCOUNT: &str = "0x0000000000000000000000000000000000000001";

/// 設定からコントローラを組み立てる（I/Oなし）
pub fn connect(config: &Config, dry_run: bool) -> Result<SyncController> {
    let options = SyncOptions::from(config);

    if dry_run {
        let account = match config.get_account() {
            Ok(account) => account,
            Err(PicWitnessError::MissingAccount) => Account::parse(DRY_RUN_ACCOUNT)?,
            Err(e) => return Err(e),
        };
        tracing::info!(%account, "ドライラン: プロセス内の台帳とストレージを使用します");

        let ledger: Arc<dyn Ledger> = Arc::new(MemoryLedger::new(account.clone()));
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        return Ok(SyncController::new(ledger, storage, account, options));
    }

    let account = config.get_account()?;
    let ledger: Arc<dyn Ledger> = Arc::new(RpcLedger::new(
        &config.ledger_url,
        account.clone(),
        config.request_timeout(),
    )?);
    let storage: Arc<dyn Storage> = Arc::new(IpfsStorage::new(
        &config.ipfs_api_url,
        config.request_timeout(),
    )?);
    tracing::debug!(ledger = %config.ledger_url, ipfs = %config.ipfs_api_url, %account, "接続先");

    Ok(SyncController::new(ledger, storage, account, options))
}

/// 起動時の読み込み
///
/// 台帳に接続できない場合はログに残してエラーを返す。
pub async fn initial_load(controller: &mut SyncController) -> Result<CountChange> {
    controller.refresh_count().await.inspect_err(|e| {
        if e.is_connectivity() {
            tracing::error!(error = %e, "台帳が見つかりません");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ACCOUNT_ENV, ENV_LOCK};

    #[test]
    fn test_connect_requires_account_for_network() {
        let config = Config::default();
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // 環境変数が設定されている環境ではスキップ
        if std::env::var(ACCOUNT_ENV).is_ok() {
            return;
        }
        let result = connect(&config, false);
        assert!(matches!(result, Err(PicWitnessError::MissingAccount)));
    }

    #[tokio::test]
    async fn test_dry_run_starts_empty() {
        let config = Config {
            account: Some("0x00000000000000000000000000000000000000aa".to_string()),
            ..Default::default()
        };
        let connected = {
            let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            connect(&config, true)
        };
        let mut controller = connected.unwrap();
        let change = initial_load(&mut controller).await.unwrap();
        assert_eq!(change, CountChange::Unchanged(0));
        assert!(controller.view().items.is_empty());
    }
}
