//! 同期コントローラ
//!
//! 台帳が返す件数の変化を検知したときだけ写真リストを再構築し、
//! 写真追加（ストレージ保存 → 台帳記録）の2段階処理を仲介する。
//!
//! 状態遷移:
//! - Idle --(ファイル選択)--> Ready --(アップロード成功)--> Idle
//! - Ready --(ストレージ失敗)--> Ready（画像は保持、エラーを返す）
//! - Idle --(件数変化を検知)--> Refreshing --(全件決着)--> Idle

mod resolve;

pub use resolve::{Resolution, resolve_items};

use crate::config::Config;
use crate::error::{PicWitnessError, Result};
use crate::ledger::Ledger;
use crate::picture;
use crate::storage::Storage;
use pic_witness_common::{Account, ContentId, Phase, TxReceipt, ViewState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// リフレッシュの並列数とタイムアウト
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub max_concurrent_lookups: usize,
    pub lookup_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 8,
            lookup_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent_lookups: config.lookup_concurrency(),
            lookup_timeout: config.lookup_timeout(),
        }
    }
}

/// refresh_count の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountChange {
    Unchanged(u64),
    Changed { from: u64, to: u64 },
}

impl CountChange {
    pub fn changed(&self) -> bool {
        matches!(self, CountChange::Changed { .. })
    }
}

/// 写真追加の結果
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub content_id: ContentId,
    pub receipt: TxReceipt,
    /// 記録後の件数確認（失敗時は None、ログに残る）
    pub count_change: Option<CountChange>,
}

pub struct SyncController {
    ledger: Arc<dyn Ledger>,
    storage: Arc<dyn Storage>,
    signer: Account,
    options: SyncOptions,
    view: ViewState,
}

impl SyncController {
    /// 接続ハンドルは呼び出し側が所有し、ここに注入する
    pub fn new(
        ledger: Arc<dyn Ledger>,
        storage: Arc<dyn Storage>,
        signer: Account,
        options: SyncOptions,
    ) -> Self {
        Self {
            ledger,
            storage,
            signer,
            options,
            view: ViewState::default(),
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn signer(&self) -> &Account {
        &self.signer
    }

    /// 件数を取得し、前回と異なればリストを再構築する
    pub async fn refresh_count(&mut self) -> Result<CountChange> {
        let current = self.view.item_count;
        let latest = self.ledger.item_count().await?;

        if latest == current {
            tracing::debug!(count = latest, "件数変化なし");
            return Ok(CountChange::Unchanged(latest));
        }

        tracing::info!(from = current, to = latest, "件数が変化しました");
        self.view.item_count = latest;
        self.refresh_items().await;
        Ok(CountChange::Changed {
            from: current,
            to: latest,
        })
    }

    /// `[0, item_count)` を解決し、結果を一括で反映する
    ///
    /// 解決できなかったインデックスはリストから外し、gaps に記録する。
    pub async fn refresh_items(&mut self) {
        self.view.phase = Phase::Refreshing;

        let resolution = resolve_items(
            self.ledger.as_ref(),
            self.view.item_count,
            self.options.max_concurrent_lookups,
            self.options.lookup_timeout,
        )
        .await;

        if !resolution.gaps.is_empty() {
            tracing::warn!(
                resolved = resolution.items.len(),
                missing = resolution.gaps.len(),
                "一部の写真を取得できませんでした"
            );
        }

        self.view.publish(resolution.items, resolution.gaps);
        self.view.settle();
    }

    /// 件数に関係なく台帳から読み直す
    pub async fn reload(&mut self) -> Result<()> {
        self.view.item_count = self.ledger.item_count().await?;
        self.refresh_items().await;
        Ok(())
    }

    /// 送信する画像を保持する（I/Oなし）
    ///
    /// 画像でないバイト列は拒否し、それまでの選択は維持する。
    pub fn begin_upload(&mut self, bytes: Vec<u8>) -> Result<()> {
        let format = picture::detect_format(&bytes)?;
        tracing::debug!(?format, size = bytes.len(), "アップロード待ち");

        self.view.pending_upload = Some(bytes);
        self.view.settle();
        Ok(())
    }

    /// ファイルを読み込んで begin_upload する
    pub async fn select_file(&mut self, path: &Path) -> Result<()> {
        let bytes = picture::read_picture(path).await?;
        self.begin_upload(bytes)
    }

    /// ストレージ保存 → 台帳記録 → 件数確認
    ///
    /// ストレージで失敗した場合は台帳に何も書かない。
    /// 台帳で失敗した場合は `OrphanedContent` を返す。
    /// どちらの失敗でも選択中の画像は保持する。
    pub async fn submit_upload(&mut self) -> Result<UploadOutcome> {
        let bytes = self
            .view
            .pending_upload
            .take()
            .ok_or(PicWitnessError::NothingToUpload)?;
        self.view.phase = Phase::Uploading;

        let content_id = match self.storage.put(&bytes).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "ストレージへの保存に失敗しました");
                self.view.pending_upload = Some(bytes);
                self.view.settle();
                return Err(e);
            }
        };
        tracing::info!(%content_id, "ストレージに保存しました");

        let receipt = match self.ledger.append_item(&content_id, &self.signer).await {
            Ok(receipt) => receipt,
            Err(PicWitnessError::DuplicateItem(id)) => {
                // 同じ画像は既に記録済み
                tracing::info!(content_id = %id, "既に台帳に記録されています");
                self.view.settle();
                return Err(PicWitnessError::DuplicateItem(id));
            }
            Err(e) => {
                tracing::warn!(
                    %content_id,
                    error = %e,
                    "台帳への記録に失敗しました。ストレージ上のデータはどこからも参照されません"
                );
                self.view.pending_upload = Some(bytes);
                self.view.settle();
                return Err(PicWitnessError::OrphanedContent {
                    content_id,
                    cause: Box::new(e),
                });
            }
        };
        tracing::info!(%content_id, tx = %receipt.transaction_hash, "台帳に記録しました");

        self.view.settle();
        let count_change = self.refresh_count_after_write().await;

        Ok(UploadOutcome {
            content_id,
            receipt,
            count_change,
        })
    }

    /// 入力中の説明文を保持する
    pub fn set_description_draft(&mut self, text: &str) {
        self.view.pending_description_draft = text.to_string();
    }

    /// 説明文を台帳に書き込み、件数を確認する
    ///
    /// 件数は変わらないのでリストは再構築されず、表示中の説明文は
    /// 次に件数が変わるか reload するまで古いまま残る。
    pub async fn submit_description(
        &mut self,
        content_id: &ContentId,
        text: &str,
    ) -> Result<TxReceipt> {
        self.view.pending_description_draft = text.to_string();

        let receipt = self
            .ledger
            .set_description(content_id, text, &self.signer)
            .await
            .inspect_err(|e| {
                tracing::error!(%content_id, error = %e, "説明文を記録できませんでした")
            })?;
        tracing::info!(%content_id, tx = %receipt.transaction_hash, "説明文を記録しました");

        self.refresh_count_after_write().await;
        Ok(receipt)
    }

    /// 入力中の説明文を送信する
    pub async fn submit_description_draft(&mut self, content_id: &ContentId) -> Result<TxReceipt> {
        let text = self.view.pending_description_draft.clone();
        self.submit_description(content_id, &text).await
    }

    async fn refresh_count_after_write(&mut self) -> Option<CountChange> {
        match self.refresh_count().await {
            Ok(change) => Some(change),
            Err(e) => {
                // 書き込み自体は成功している
                tracing::warn!(error = %e, "書き込み後の件数確認に失敗しました");
                None
            }
        }
    }
}
