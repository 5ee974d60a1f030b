//! ビュー状態
//!
//! 同期コントローラだけが書き換える。写真リストは差分更新せず、
//! リフレッシュ完了時に一括で差し替える。

use crate::types::{ContentId, Item};
use serde::{Deserialize, Serialize};
use std::fmt;

/// コントローラの状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// 待機中
    #[default]
    Idle,
    /// アップロード待ちのファイルあり
    Ready,
    /// ストレージ・台帳へ書き込み中
    Uploading,
    /// 台帳から写真リストを再構築中
    Refreshing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Ready => write!(f, "ready"),
            Phase::Uploading => write!(f, "uploading"),
            Phase::Refreshing => write!(f, "refreshing"),
        }
    }
}

/// 解決に失敗したインデックス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionGap {
    pub index: u64,
    /// 取得できていればコンテンツID（詳細取得で失敗した場合）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<ContentId>,
    pub reason: String,
}

/// 画面状態
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// 最後に観測した台帳上の件数
    pub item_count: u64,
    /// インデックス順の写真リスト
    pub items: Vec<Item>,
    /// 直近のリフレッシュで解決できなかったインデックス
    pub gaps: Vec<ResolutionGap>,
    /// 選択済みでまだ送信していない画像
    #[serde(skip)]
    pub pending_upload: Option<Vec<u8>>,
    /// 入力中の説明文
    pub pending_description_draft: String,
    pub phase: Phase,
}

impl ViewState {
    /// 送信ボタンが有効か
    pub fn is_submit_enabled(&self) -> bool {
        self.pending_upload.is_some() && matches!(self.phase, Phase::Idle | Phase::Ready)
    }

    /// リフレッシュ結果を一括で反映
    pub fn publish(&mut self, items: Vec<Item>, gaps: Vec<ResolutionGap>) {
        self.items = items;
        self.gaps = gaps;
    }

    /// 保留中アップロードの有無から待機状態を決める
    pub fn settle(&mut self) {
        self.phase = if self.pending_upload.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        };
    }

    pub fn find(&self, content_id: &ContentId) -> Option<&Item> {
        self.items.iter().find(|item| &item.content_id == content_id)
    }

    /// 全件揃っているか（件数とリストが一致し、欠落なし）
    pub fn is_consistent(&self) -> bool {
        self.gaps.is_empty() && self.items.len() as u64 == self.item_count
    }
}
