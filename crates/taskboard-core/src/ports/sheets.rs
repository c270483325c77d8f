//! SheetsApi port - スプレッドシートの値アクセス
//!
//! 行はすべて文字列セルの配列として扱う。`index` はヘッダー行を除いた
//! 0 始まりのデータ行番号。
//!
//! # 実装
//! - `impls::HttpSheetsApi`: Google Sheets v4 REST
//! - `impls::InMemorySheets`: 開発・テスト用

use async_trait::async_trait;

use crate::domain::StoreError;

pub type Row = Vec<String>;

#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// ヘッダーより下のデータ行をすべて読む
    ///
    /// `width` はスキーマの列数。はみ出した列を検出できるよう、実装は
    /// それより広く読んでもよい（幅の検証は呼び出し側で行う）。
    async fn read_rows(&self, sheet: &str, width: usize) -> Result<Vec<Row>, StoreError>;

    async fn append_row(&self, sheet: &str, row: Row) -> Result<(), StoreError>;

    async fn update_row(&self, sheet: &str, index: usize, row: Row) -> Result<(), StoreError>;

    async fn delete_row(&self, sheet: &str, index: usize) -> Result<(), StoreError>;
}
