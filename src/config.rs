use crate::error::{PicWitnessError, Result};
use pic_witness_common::{Account, DEFAULT_GATEWAY_BASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ACCOUNT_ENV: &str = "PIC_WITNESS_ACCOUNT";

/// 環境変数を読み書きするテストを直列化する
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 署名アカウント（環境変数が優先）
    pub account: Option<String>,
    /// 台帳ゲートウェイ（JSON-RPC）
    pub ledger_url: String,
    /// IPFSノードのAPI
    pub ipfs_api_url: String,
    /// 画像表示用の公開ゲートウェイ
    pub gateway_base: String,
    /// リフレッシュ時の同時解決数
    pub max_concurrent_lookups: usize,
    /// インデックス1件あたりの解決タイムアウト
    pub lookup_timeout_seconds: u64,
    /// HTTPリクエストのタイムアウト
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PicWitnessError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pic-witness").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            account: None,
            ledger_url: "http://127.0.0.1:8545".into(),
            ipfs_api_url: "http://127.0.0.1:5001".into(),
            gateway_base: DEFAULT_GATEWAY_BASE.into(),
            max_concurrent_lookups: 8,
            lookup_timeout_seconds: 30,
            timeout_seconds: 120,
        }
    }

    pub fn get_account(&self) -> Result<Account> {
        // 環境変数を優先
        if let Ok(value) = std::env::var(ACCOUNT_ENV) {
            if !value.trim().is_empty() {
                return Ok(Account::parse(&value)?);
            }
        }

        let stored = self.account.as_deref().ok_or(PicWitnessError::MissingAccount)?;
        Ok(Account::parse(stored)?)
    }

    /// 保存前に形式を検証する
    pub fn set_account(&mut self, account: &str) -> Result<()> {
        let account = Account::parse(account)?;
        self.account = Some(account.to_string());
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_seconds.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    /// 0は無制限ではなく1として扱う
    pub fn lookup_concurrency(&self) -> usize {
        self.max_concurrent_lookups.max(1)
    }
}
