//! Errors - ストア操作のエラー分類
//!
//! - Transport: ネットワーク / HTTP / 認可の失敗
//! - NotFound: 書き込み時に対象レコードが存在しない
//! - Rejected: リモートエンドポイントが `success:false` を返した（アプリ側の失敗）
//! - MalformedRow: シートの行が列スキーマに合わない
//! - Decode: レスポンス本文を解釈できない

use thiserror::Error;

/// StoreError は TaskStore の全実装で共通のエラー型
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("request `{action}` rejected: {message}")]
    Rejected { action: String, message: String },

    #[error("malformed row {row} in sheet `{sheet}`: {reason}")]
    MalformedRow {
        sheet: String,
        row: usize,
        reason: String,
    },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "task",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}
