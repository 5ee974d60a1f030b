//! プロセス内の台帳
//!
//! アカウントごとの写真リストと、アカウントとコンテンツIDの組ごとの説明文・追加時刻を持つ。
//! 呼び出し回数のカウンタと失敗注入を備え、テストとドライランで使う。

use super::Ledger;
use crate::error::{PicWitnessError, Result};
use async_trait::async_trait;
use pic_witness_common::{Account, ContentId, ItemDetails, TxReceipt};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Record {
    description: String,
    timestamp: u64,
}

#[derive(Default)]
struct Contract {
    pictures: HashMap<Account, Vec<ContentId>>,
    /// 同じ画像を複数のアカウントが記録できるよう (所有者, ID) で持つ
    records: HashMap<(Account, ContentId), Record>,
}

/// 呼び出し回数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub count: u64,
    pub id_at: u64,
    pub details: u64,
    pub append: u64,
    pub describe: u64,
}

pub struct MemoryLedger {
    /// 読み取りの対象アカウント
    viewer: Account,
    contract: Mutex<Contract>,
    nonce: AtomicU64,

    fail_count: AtomicBool,
    fail_appends: AtomicBool,
    fail_descriptions: AtomicBool,
    failing_indices: Mutex<HashSet<u64>>,
    failing_details: Mutex<HashSet<ContentId>>,
    hanging_indices: Mutex<HashSet<u64>>,

    count_calls: AtomicU64,
    id_calls: AtomicU64,
    detail_calls: AtomicU64,
    append_calls: AtomicU64,
    describe_calls: AtomicU64,
}

impl MemoryLedger {
    pub fn new(viewer: Account) -> Self {
        Self {
            viewer,
            contract: Mutex::new(Contract::default()),
            nonce: AtomicU64::new(0),
            fail_count: AtomicBool::new(false),
            fail_appends: AtomicBool::new(false),
            fail_descriptions: AtomicBool::new(false),
            failing_indices: Mutex::new(HashSet::new()),
            failing_details: Mutex::new(HashSet::new()),
            hanging_indices: Mutex::new(HashSet::new()),
            count_calls: AtomicU64::new(0),
            id_calls: AtomicU64::new(0),
            detail_calls: AtomicU64::new(0),
            append_calls: AtomicU64::new(0),
            describe_calls: AtomicU64::new(0),
        }
    }

    pub fn viewer(&self) -> &Account {
        &self.viewer
    }

    /// 呼び出し回数を数えずに写真を登録する
    pub async fn seed(
        &self,
        owner: &Account,
        content_id: ContentId,
        description: &str,
        timestamp: u64,
    ) {
        let mut contract = self.contract.lock().await;
        contract
            .pictures
            .entry(owner.clone())
            .or_default()
            .push(content_id.clone());
        contract.records.insert(
            (owner.clone(), content_id),
            Record {
                description: description.to_string(),
                timestamp,
            },
        );
    }

    /// 台帳上の説明文を直接読む（カウントしない）
    pub async fn description_of(&self, content_id: &ContentId) -> Option<String> {
        self.contract
            .lock()
            .await
            .records
            .get(&(self.viewer.clone(), content_id.clone()))
            .map(|r| r.description.clone())
    }

    pub fn set_count_failing(&self, failing: bool) {
        self.fail_count.store(failing, Ordering::SeqCst);
    }

    pub fn set_appends_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    pub fn set_descriptions_failing(&self, failing: bool) {
        self.fail_descriptions.store(failing, Ordering::SeqCst);
    }

    /// 指定インデックスのID取得を失敗させる
    pub async fn fail_index(&self, index: u64) {
        self.failing_indices.lock().await.insert(index);
    }

    /// 指定IDの詳細取得を失敗させる
    pub async fn fail_details_for(&self, content_id: ContentId) {
        self.failing_details.lock().await.insert(content_id);
    }

    /// 指定インデックスのID取得を永久に返さない
    pub async fn hang_index(&self, index: u64) {
        self.hanging_indices.lock().await.insert(index);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            count: self.count_calls.load(Ordering::SeqCst),
            id_at: self.id_calls.load(Ordering::SeqCst),
            details: self.detail_calls.load(Ordering::SeqCst),
            append: self.append_calls.load(Ordering::SeqCst),
            describe: self.describe_calls.load(Ordering::SeqCst),
        }
    }

    fn receipt(&self, signer: &Account, content_id: &ContentId) -> TxReceipt {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let digest = Sha256::digest(format!("{}:{}:{}", signer, content_id, nonce));
        TxReceipt {
            transaction_hash: format!("0x{}", hex::encode(digest)),
        }
    }
}

fn now_seconds() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn item_count(&self) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(PicWitnessError::Ledger("count unavailable".to_string()));
        }

        let contract = self.contract.lock().await;
        Ok(contract
            .pictures
            .get(&self.viewer)
            .map(|list| list.len() as u64)
            .unwrap_or(0))
    }

    async fn item_id_at(&self, index: u64) -> Result<ContentId> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);

        if self.hanging_indices.lock().await.contains(&index) {
            futures::future::pending::<()>().await;
        }
        if self.failing_indices.lock().await.contains(&index) {
            return Err(PicWitnessError::Ledger(format!("getPictureHash({}) reverted", index)));
        }

        let contract = self.contract.lock().await;
        contract
            .pictures
            .get(&self.viewer)
            .and_then(|list| usize::try_from(index).ok().and_then(|i| list.get(i)))
            .cloned()
            .ok_or_else(|| PicWitnessError::Ledger(format!("index out of range: {}", index)))
    }

    async fn item_details(&self, content_id: &ContentId) -> Result<ItemDetails> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_details.lock().await.contains(content_id) {
            return Err(PicWitnessError::Ledger(format!(
                "getPictureDetails({}) reverted",
                content_id
            )));
        }

        let contract = self.contract.lock().await;
        contract
            .records
            .get(&(self.viewer.clone(), content_id.clone()))
            .map(|record| ItemDetails {
                description: record.description.clone(),
                timestamp: record.timestamp,
            })
            .ok_or_else(|| PicWitnessError::UnknownItem(content_id.clone()))
    }

    async fn append_item(&self, content_id: &ContentId, signer: &Account) -> Result<TxReceipt> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(PicWitnessError::Ledger("transaction rejected by signer".to_string()));
        }

        let mut contract = self.contract.lock().await;
        let key = (signer.clone(), content_id.clone());
        if contract.records.contains_key(&key) {
            return Err(PicWitnessError::DuplicateItem(content_id.clone()));
        }

        contract
            .pictures
            .entry(signer.clone())
            .or_default()
            .push(content_id.clone());
        contract.records.insert(
            key,
            Record {
                description: String::new(),
                timestamp: now_seconds(),
            },
        );
        drop(contract);

        Ok(self.receipt(signer, content_id))
    }

    async fn set_description(
        &self,
        content_id: &ContentId,
        text: &str,
        signer: &Account,
    ) -> Result<TxReceipt> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_descriptions.load(Ordering::SeqCst) {
            return Err(PicWitnessError::Ledger("transaction rejected by signer".to_string()));
        }

        let mut contract = self.contract.lock().await;
        let key = (signer.clone(), content_id.clone());
        if let Some(record) = contract.records.get_mut(&key) {
            record.description = text.to_string();
        } else if contract.records.keys().any(|(_, id)| id == content_id) {
            return Err(PicWitnessError::Ledger(format!(
                "{} is not the owner of {}",
                signer, content_id
            )));
        } else {
            return Err(PicWitnessError::UnknownItem(content_id.clone()));
        }
        drop(contract);

        Ok(self.receipt(signer, content_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::content_id_for;

    fn alice() -> Account {
        Account::parse("0x1111111111111111111111111111111111111111").unwrap()
    }

    fn bob() -> Account {
        Account::parse("0x2222222222222222222222222222222222222222").unwrap()
    }

    #[tokio::test]
    async fn test_append_then_read() {
        let ledger = MemoryLedger::new(alice());
        let id = content_id_for(b"one").unwrap();
        ledger.append_item(&id, &alice()).await.unwrap();

        assert_eq!(ledger.item_count().await.unwrap(), 1);
        assert_eq!(ledger.item_id_at(0).await.unwrap(), id);
        let details = ledger.item_details(&id).await.unwrap();
        assert_eq!(details.description, "");
        assert!(details.timestamp > 0);
    }

    #[tokio::test]
    async fn test_counts_are_per_account() {
        let ledger = MemoryLedger::new(alice());
        ledger
            .append_item(&content_id_for(b"bob's").unwrap(), &bob())
            .await
            .unwrap();
        assert_eq!(ledger.item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_picture_for_two_accounts() {
        let ledger = MemoryLedger::new(alice());
        let id = content_id_for(b"shared").unwrap();
        ledger.append_item(&id, &bob()).await.unwrap();

        // 他人が記録済みの画像でも自分のリストには追加できる
        ledger.append_item(&id, &alice()).await.unwrap();
        assert_eq!(ledger.item_count().await.unwrap(), 1);
        assert_eq!(ledger.item_id_at(0).await.unwrap(), id);

        ledger.set_description(&id, "alice", &alice()).await.unwrap();
        ledger.set_description(&id, "bob", &bob()).await.unwrap();
        assert_eq!(ledger.description_of(&id).await.as_deref(), Some("alice"));

        let result = ledger.append_item(&id, &alice()).await;
        assert!(matches!(result, Err(PicWitnessError::DuplicateItem(_))));
    }

    #[tokio::test]
    async fn test_duplicate_append_rejected() {
        let ledger = MemoryLedger::new(alice());
        let id = content_id_for(b"same").unwrap();
        ledger.append_item(&id, &alice()).await.unwrap();
        let result = ledger.append_item(&id, &alice()).await;
        assert!(matches!(result, Err(PicWitnessError::DuplicateItem(_))));
        assert_eq!(ledger.item_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_only_owner_can_describe() {
        let ledger = MemoryLedger::new(alice());
        let id = content_id_for(b"mine").unwrap();
        ledger.append_item(&id, &alice()).await.unwrap();

        assert!(ledger.set_description(&id, "盗用", &bob()).await.is_err());
        ledger.set_description(&id, "海", &alice()).await.unwrap();
        assert_eq!(ledger.description_of(&id).await.as_deref(), Some("海"));
    }

    #[tokio::test]
    async fn test_describe_unknown_item() {
        let ledger = MemoryLedger::new(alice());
        let id = content_id_for(b"missing").unwrap();
        let result = ledger.set_description(&id, "x", &alice()).await;
        assert!(matches!(result, Err(PicWitnessError::UnknownItem(_))));
    }

    #[tokio::test]
    async fn test_receipts_are_unique() {
        let ledger = MemoryLedger::new(alice());
        let id = content_id_for(b"r").unwrap();
        let first = ledger.append_item(&id, &alice()).await.unwrap();
        let second = ledger.set_description(&id, "d", &alice()).await.unwrap();
        assert_ne!(first.transaction_hash, second.transaction_hash);
        assert!(first.transaction_hash.starts_with("0x"));
        assert_eq!(first.transaction_hash.len(), 66);
    }

    #[tokio::test]
    async fn test_call_counters() {
        let ledger = MemoryLedger::new(alice());
        ledger.item_count().await.unwrap();
        ledger.item_count().await.unwrap();
        let calls = ledger.calls();
        assert_eq!(calls.count, 2);
        assert_eq!(calls.details, 0);
    }
}
