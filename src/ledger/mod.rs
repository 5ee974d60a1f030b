//! 台帳ゲートウェイ
//!
//! デプロイ済みコントラクトへの読み書き。すべて非同期かつ失敗しうる。
//! 並行に発行した呼び出し同士の順序は仮定しない。

mod memory;
mod rpc;

pub use memory::{CallCounts, MemoryLedger};
pub use rpc::{RpcLedger, decode_details, decode_receipt, decode_uint};

use crate::error::Result;
use async_trait::async_trait;
use pic_witness_common::{Account, ContentId, ItemDetails, TxReceipt};

#[async_trait]
pub trait Ledger: Send + Sync {
    /// 接続中アカウントの写真件数
    async fn item_count(&self) -> Result<u64>;

    /// インデックス → コンテンツID
    async fn item_id_at(&self, index: u64) -> Result<ContentId>;

    /// コンテンツID → 説明文・追加時刻
    async fn item_details(&self, content_id: &ContentId) -> Result<ItemDetails>;

    async fn append_item(&self, content_id: &ContentId, signer: &Account) -> Result<TxReceipt>;

    async fn set_description(
        &self,
        content_id: &ContentId,
        text: &str,
        signer: &Account,
    ) -> Result<TxReceipt>;
}
