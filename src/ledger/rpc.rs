//! JSON-RPC 2.0 経由の台帳
//!
//! コントラクトゲートウェイのエンドポイントにメソッド名をそのまま投げる:
//! - getUserPictureCount / getPictureHash / getPictureDetails（読み取り）
//! - addPicture / addPictureDescription（書き込み、`from` が署名者）
//!
//! 読み取りは接続時に渡したアカウントのリストが対象。
//! addPicture の revert 理由が登録済みを示す場合は `DuplicateItem` を返す。

use super::Ledger;
use crate::error::{PicWitnessError, Result};
use async_trait::async_trait;
use pic_witness_common::{Account, ContentId, ItemDetails, TxReceipt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct RpcLedger {
    client: Client,
    endpoint: String,
    account: Account,
    next_id: AtomicU64,
}

impl RpcLedger {
    /// 接続ハンドルを作る（I/Oは行わない）
    pub fn new(endpoint: &str, account: Account, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            account,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(method, id = request.id, "台帳呼び出し");

        let res = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    PicWitnessError::Connectivity(format!(
                        "台帳に接続できません ({}): {}",
                        self.endpoint, e
                    ))
                } else {
                    PicWitnessError::Http(e)
                }
            })?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(PicWitnessError::Ledger(format!(
                "{} failed (status {}): {}",
                method, status, text
            )));
        }

        let response: RpcResponse = serde_json::from_str(&text)?;
        unwrap_response(method, response)
    }
}

fn unwrap_response(method: &str, response: RpcResponse) -> Result<Value> {
    if let Some(error) = response.error {
        return Err(PicWitnessError::Ledger(format!(
            "{} error {}: {}",
            method, error.code, error.message
        )));
    }
    response
        .result
        .ok_or_else(|| PicWitnessError::Ledger(format!("{}: result missing", method)))
}

/// 登録済みを示す revert 理由（小文字で比較）
const DUPLICATE_MARKERS: &[&str] = &["already", "duplicate", "exists"];

fn is_duplicate_revert(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    DUPLICATE_MARKERS.iter().any(|marker| message.contains(marker))
}

/// addPicture の失敗を分類する
fn classify_append_error(content_id: &ContentId, error: PicWitnessError) -> PicWitnessError {
    match error {
        PicWitnessError::Ledger(message) if is_duplicate_revert(&message) => {
            tracing::debug!(%content_id, %message, "登録済みの写真です");
            PicWitnessError::DuplicateItem(content_id.clone())
        }
        other => other,
    }
}

/// 数値・10進文字列・0x付き16進文字列を u64 に変換
pub fn decode_uint(value: &Value) -> Result<u64> {
    let invalid = || PicWitnessError::Ledger(format!("not an unsigned integer: {}", value));

    match value {
        Value::Number(n) => n.as_u64().ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                u64::from_str_radix(hex, 16).map_err(|_| invalid())
            } else {
                s.parse::<u64>().map_err(|_| invalid())
            }
        }
        _ => Err(invalid()),
    }
}

/// `[description, timestamp]` または `{description, timestamp}` を受け付ける
pub fn decode_details(value: &Value) -> Result<ItemDetails> {
    match value {
        Value::Array(fields) if fields.len() >= 2 => {
            let description = fields[0]
                .as_str()
                .ok_or_else(|| {
                    PicWitnessError::Ledger(format!("description is not a string: {}", fields[0]))
                })?
                .to_string();
            let timestamp = decode_uint(&fields[1])?;
            Ok(ItemDetails { description, timestamp })
        }
        Value::Object(map) => {
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let timestamp = map
                .get("timestamp")
                .ok_or_else(|| PicWitnessError::Ledger("timestamp missing".to_string()))
                .and_then(decode_uint)?;
            Ok(ItemDetails { description, timestamp })
        }
        _ => Err(PicWitnessError::Ledger(format!("unexpected picture details: {}", value))),
    }
}

/// トランザクションハッシュ文字列、または `{transactionHash}` / `{tx}` を受け付ける
pub fn decode_receipt(value: &Value) -> Result<TxReceipt> {
    let hash = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get("transactionHash")
            .or_else(|| map.get("tx"))
            .and_then(Value::as_str),
        _ => None,
    };

    hash.filter(|h| !h.is_empty())
        .map(|h| TxReceipt {
            transaction_hash: h.to_string(),
        })
        .ok_or_else(|| PicWitnessError::Ledger(format!("unexpected transaction result: {}", value)))
}

fn decode_content_id(value: &Value) -> Result<ContentId> {
    let hash = value.as_str().ok_or_else(|| {
        PicWitnessError::Ledger(format!("picture hash is not a string: {}", value))
    })?;
    Ok(ContentId::parse(hash)?)
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn item_count(&self) -> Result<u64> {
        let result = self
            .call("getUserPictureCount", json!({ "from": self.account }))
            .await?;
        decode_uint(&result)
    }

    async fn item_id_at(&self, index: u64) -> Result<ContentId> {
        let result = self
            .call(
                "getPictureHash",
                json!({ "index": index.to_string(), "from": self.account }),
            )
            .await?;
        decode_content_id(&result)
    }

    async fn item_details(&self, content_id: &ContentId) -> Result<ItemDetails> {
        let result = self
            .call("getPictureDetails", json!({ "hash": content_id }))
            .await?;
        decode_details(&result)
    }

    async fn append_item(&self, content_id: &ContentId, signer: &Account) -> Result<TxReceipt> {
        let result = self
            .call("addPicture", json!({ "hash": content_id, "from": signer }))
            .await
            .map_err(|e| classify_append_error(content_id, e))?;
        decode_receipt(&result)
    }

    async fn set_description(
        &self,
        content_id: &ContentId,
        text: &str,
        signer: &Account,
    ) -> Result<TxReceipt> {
        let result = self
            .call(
                "addPictureDescription",
                json!({ "hash": content_id, "description": text, "from": signer }),
            )
            .await?;
        decode_receipt(&result)
    }
}
