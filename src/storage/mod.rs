//! ストレージゲートウェイ
//!
//! コンテンツアドレス型ストレージに「バイト列を置いてIDを得る」だけの窓口。
//! 同じバイト列からは常に同じIDが返る。

mod ipfs;
mod memory;

pub use ipfs::{IpfsStorage, parse_add_response};
pub use memory::{MemoryStorage, content_id_for};

use crate::error::Result;
use async_trait::async_trait;
use pic_witness_common::ContentId;

#[async_trait]
pub trait Storage: Send + Sync {
    /// バイト列を保存し、コンテンツIDを返す
    async fn put(&self, bytes: &[u8]) -> Result<ContentId>;
}
