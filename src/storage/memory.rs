//! プロセス内ストレージ
//!
//! sha2-256 のマルチハッシュから CIDv1（raw, base16）を導出する。
//! テストとドライランで使う。

use super::Storage;
use crate::error::{PicWitnessError, Result};
use async_trait::async_trait;
use pic_witness_common::ContentId;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// CIDv1 ヘッダ: version=1, codec=raw(0x55), sha2-256(0x12), 長さ32(0x20)
const CID_V1_RAW_SHA256_PREFIX: &str = "01551220";

/// バイト列からコンテンツIDを導出
pub fn content_id_for(bytes: &[u8]) -> Result<ContentId> {
    let digest = Sha256::digest(bytes);
    let encoded = format!("f{}{}", CID_V1_RAW_SHA256_PREFIX, hex::encode(digest));
    Ok(ContentId::parse(&encoded)?)
}

#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<ContentId, Vec<u8>>>,
    fail_puts: AtomicBool,
    put_calls: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の put を失敗させる
    pub fn set_failing(&self, failing: bool) {
        self.fail_puts.store(failing, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> u64 {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, content_id: &ContentId) -> Option<Vec<u8>> {
        self.blobs.lock().await.get(content_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(PicWitnessError::Storage("storage unavailable".to_string()));
        }

        let id = content_id_for(bytes)?;
        self.blobs
            .lock()
            .await
            .entry(id.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(id)
    }
}
