//! ドメイン型定義
//!
//! CLIと同期コントローラで共有される型:
//! - ContentId: ストレージネットワークが割り当てるコンテンツID
//! - Account: 台帳への書き込みに署名するアカウント
//! - ItemDetails: 台帳が返す写真メタデータ
//! - Item: 画面に表示する写真レコード

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// コンテンツアドレス (IPFS CID)
///
/// 受け付ける形式:
/// - CIDv0: `Qm` + base58btc 44文字
/// - CIDv1 base32: `b` + `[a-z2-7]` 58文字以上
/// - CIDv1 base16: `f` + 小文字16進 66文字以上
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    pub fn parse(value: &str) -> Result<Self> {
        lazy_static::lazy_static! {
            static ref CID_V0: Regex = Regex::new(r"^Qm[1-9A-HJ-NP-Za-km-z]{44}$").unwrap();
            static ref CID_V1_BASE32: Regex = Regex::new(r"^b[a-z2-7]{58,}$").unwrap();
            static ref CID_V1_BASE16: Regex = Regex::new(r"^f[0-9a-f]{66,}$").unwrap();
        }

        let trimmed = value.trim();
        if CID_V0.is_match(trimmed)
            || CID_V1_BASE32.is_match(trimmed)
            || CID_V1_BASE16.is_match(trimmed)
        {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(Error::InvalidContentId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 署名アカウント (`0x` + 16進40文字)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    pub fn parse(value: &str) -> Result<Self> {
        lazy_static::lazy_static! {
            static ref ADDRESS: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap();
        }

        let trimmed = value.trim();
        if ADDRESS.is_match(trimmed) {
            // 大文字小文字は区別しない
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidAccount(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Account {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Account {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

/// 台帳の写真メタデータ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    #[serde(default)]
    pub description: String,

    /// 追加時刻（Unix秒、ブロック時刻）
    pub timestamp: u64,
}

/// 画面に表示する写真レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub content_id: ContentId,
    pub description: String,
    pub added_at: DateTime<Utc>,
}

impl Item {
    pub fn from_details(content_id: ContentId, details: ItemDetails) -> Self {
        // 範囲外のタイムスタンプはエポックとして扱う
        let added_at = i64::try_from(details.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();

        Self {
            content_id,
            description: details.description,
            added_at,
        }
    }
}

/// 台帳への書き込み結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
}
