//! 表示用ヘルパー
//!
//! 写真1件につき説明文・追加日・ゲートウェイ経由の画像URLを出す。

use crate::types::{ContentId, Item};
use crate::view::ViewState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 公開ゲートウェイのデフォルト
pub const DEFAULT_GATEWAY_BASE: &str = "https://ipfs.io/ipfs";

/// 表示用の写真1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub content_id: String,
    pub description: String,
    /// 例: "October 18, 2026"
    pub added_on: String,
    pub image_url: String,
}

impl ItemView {
    pub fn new(item: &Item, gateway_base: &str) -> Self {
        Self {
            content_id: item.content_id.to_string(),
            description: item.description.clone(),
            added_on: format_added_on(&item.added_at),
            image_url: gateway_url(gateway_base, &item.content_id),
        }
    }
}

/// `<gateway-base>/<contentId>`
pub fn gateway_url(gateway_base: &str, content_id: &ContentId) -> String {
    format!("{}/{}", gateway_base.trim_end_matches('/'), content_id)
}

/// 長い日付形式（月名 日, 年）
pub fn format_added_on(added_at: &DateTime<Utc>) -> String {
    added_at.format("%B %-d, %Y").to_string()
}

/// ビュー状態の写真リストを表示用に変換
pub fn render_items(view: &ViewState, gateway_base: &str) -> Vec<ItemView> {
    view.items
        .iter()
        .map(|item| ItemView::new(item, gateway_base))
        .collect()
}
