//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid content id: {0}")]
    InvalidContentId(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
