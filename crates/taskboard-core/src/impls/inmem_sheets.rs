//! InMemorySheets - 開発用のスプレッドシート
//!
//! Sheets API と同じく、読み込み時は各行の末尾の空セルを落として返す。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::StoreError;
use crate::ports::{Row, SheetsApi};

/// シート名ごとにデータ行（ヘッダーなし）を保持する
#[derive(Default)]
pub struct InMemorySheets {
    sheets: Mutex<HashMap<String, Vec<Row>>>,
}

impl InMemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期データを入れる（同じシート名なら置き換え）
    pub fn with_rows(mut self, sheet: &str, rows: Vec<Row>) -> Self {
        self.sheets.get_mut().insert(sheet.to_string(), rows);
        self
    }

    /// 保存されている行をそのまま返す
    pub async fn rows(&self, sheet: &str) -> Vec<Row> {
        self.sheets
            .lock()
            .await
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }
}

fn out_of_range(sheet: &str, index: usize) -> StoreError {
    StoreError::Transport(format!("row {} is outside sheet `{sheet}`", index + 2))
}

#[async_trait]
impl SheetsApi for InMemorySheets {
    async fn read_rows(&self, sheet: &str, _width: usize) -> Result<Vec<Row>, StoreError> {
        let sheets = self.sheets.lock().await;
        let rows = sheets.get(sheet).map(Vec::as_slice).unwrap_or_default();
        Ok(rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                while row.last().is_some_and(|cell| cell.is_empty()) {
                    row.pop();
                }
                row
            })
            .collect())
    }

    async fn append_row(&self, sheet: &str, row: Row) -> Result<(), StoreError> {
        let mut sheets = self.sheets.lock().await;
        sheets.entry(sheet.to_string()).or_default().push(row);
        Ok(())
    }

    async fn update_row(&self, sheet: &str, index: usize, row: Row) -> Result<(), StoreError> {
        let mut sheets = self.sheets.lock().await;
        let slot = sheets
            .get_mut(sheet)
            .and_then(|rows| rows.get_mut(index))
            .ok_or_else(|| out_of_range(sheet, index))?;
        *slot = row;
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, index: usize) -> Result<(), StoreError> {
        let mut sheets = self.sheets.lock().await;
        let rows = sheets
            .get_mut(sheet)
            .filter(|rows| index < rows.len())
            .ok_or_else(|| out_of_range(sheet, index))?;
        rows.remove(index);
        Ok(())
    }
}
