//! IPFSノードのHTTP APIへの書き込み

use super::Storage;
use crate::error::{PicWitnessError, Result};
use async_trait::async_trait;
use pic_witness_common::ContentId;
use reqwest::{Client, multipart};
use std::time::Duration;

pub struct IpfsStorage {
    client: Client,
    api_url: String,
}

impl IpfsStorage {
    /// `api_url` 例: http://127.0.0.1:5001
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn add_endpoint(&self) -> String {
        format!("{}/api/v0/add?pin=true", self.api_url)
    }
}

#[async_trait]
impl Storage for IpfsStorage {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let part = multipart::Part::bytes(bytes.to_vec()).file_name("picture");
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(size = bytes.len(), endpoint = %self.add_endpoint(), "IPFSへ送信");

        let res = self
            .client
            .post(self.add_endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    PicWitnessError::Connectivity(format!("IPFSノードに接続できません: {}", e))
                } else {
                    PicWitnessError::Http(e)
                }
            })?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(PicWitnessError::Storage(format!(
                "IPFS add failed (status {}): {}",
                status, text
            )));
        }

        parse_add_response(&text)
    }
}

/// `/api/v0/add` のレスポンスからハッシュを取り出す
///
/// 1行1JSONで返るため、`Hash` を持つ最後の行を採用する。
/// 例: {"Name":"picture","Hash":"Qm...","Size":"123"}
pub fn parse_add_response(text: &str) -> Result<ContentId> {
    let hash = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|json| json.get("Hash").and_then(|v| v.as_str()).map(str::to_string))
        .last()
        .ok_or_else(|| PicWitnessError::Storage(format!("unexpected ipfs response: {}", text)))?;

    Ok(ContentId::parse(&hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    #[test]
    fn test_parse_add_response_single_line() {
        let text = format!(r#"{{"Name":"picture","Hash":"{}","Size":"123"}}"#, CID);
        let id = parse_add_response(&text).unwrap();
        assert_eq!(id.as_str(), CID);
    }

    #[test]
    fn test_parse_add_response_takes_last_hash() {
        let text = format!(
            concat!(
                "{{\"Name\":\"picture\",\"Bytes\":1024}}\n",
                "{{\"Name\":\"picture\",\"Hash\":\"{}\",\"Size\":\"1035\"}}\n",
            ),
            CID
        );
        let id = parse_add_response(&text).unwrap();
        assert_eq!(id.as_str(), CID);
    }

    #[test]
    fn test_parse_add_response_without_hash() {
        let result = parse_add_response(r#"{"Message":"invalid","Code":0}"#);
        assert!(matches!(result, Err(PicWitnessError::Storage(_))));
    }

    #[test]
    fn test_parse_add_response_invalid_cid() {
        let result = parse_add_response(r#"{"Hash":"not-a-cid"}"#);
        assert!(matches!(result, Err(PicWitnessError::Common(_))));
    }

    #[test]
    fn test_add_endpoint_trims_slash() {
        let storage = IpfsStorage::new("http://127.0.0.1:5001/", Duration::from_secs(5)).unwrap();
        assert_eq!(storage.add_endpoint(), "http://127.0.0.1:5001/api/v0/add?pin=true");
    }
}
