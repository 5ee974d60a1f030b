use pic_witness_common::ContentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicWitnessError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("アカウントが設定されていません。`pic-witness config --set-account 0x...` で設定してください")]
    MissingAccount,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像ファイルではありません: {0}")]
    NotAPicture(String),

    #[error("アップロードする画像が選択されていません")]
    NothingToUpload,

    #[error("接続エラー: {0}")]
    Connectivity(String),

    #[error("ストレージ書き込みエラー: {0}")]
    Storage(String),

    #[error("台帳呼び出しエラー: {0}")]
    Ledger(String),

    #[error("既に登録済みの写真です: {0}")]
    DuplicateItem(ContentId),

    #[error("台帳に存在しない写真です: {0}")]
    UnknownItem(ContentId),

    /// ストレージには保存済みだが台帳に記録できなかった
    #[error("台帳への記録に失敗しました（{content_id} はストレージに残ります）: {cause}")]
    OrphanedContent {
        content_id: ContentId,
        cause: Box<PicWitnessError>,
    },

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] pic_witness_common::Error),
}

impl PicWitnessError {
    /// 台帳・ストレージとの通信自体が失敗したか
    pub fn is_connectivity(&self) -> bool {
        match self {
            PicWitnessError::Connectivity(_) => true,
            PicWitnessError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PicWitnessError>;
