//! HttpSheetsApi - Google Sheets v4 REST クライアント
//!
//! アクセストークンは外部の OAuth フローで取得済みのものを受け取るだけ。
//! 行削除（deleteDimension）には数値の sheetId が必要なので、
//! スプレッドシートのメタデータから一度だけ引いてキャッシュする。

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;

use crate::domain::StoreError;
use crate::ports::{Row, SheetsApi};

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug)]
pub struct HttpSheetsApi {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
    sheet_ids: OnceCell<HashMap<String, i64>>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl HttpSheetsApi {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_SHEETS_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
            sheet_ids: OnceCell::new(),
        })
    }

    /// API のベース URL を差し替える（テスト用のローカルサーバーなど）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    async fn check(response: Response, what: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(backend = "sheets", %status, what, "sheets api error");
        Err(StoreError::Transport(format!("{what}: HTTP {status}: {body}")))
    }

    async fn sheet_id(&self, sheet: &str) -> Result<i64, StoreError> {
        let ids = self
            .sheet_ids
            .get_or_try_init(|| async {
                let url = format!("{}/{}", self.base_url, self.spreadsheet_id);
                let response = self
                    .client
                    .get(&url)
                    .query(&[("fields", "sheets.properties")])
                    .bearer_auth(&self.access_token)
                    .send()
                    .await?;
                let meta: SpreadsheetMeta = Self::check(response, "spreadsheet metadata")
                    .await?
                    .json()
                    .await?;
                Ok::<_, StoreError>(
                    meta.sheets
                        .into_iter()
                        .map(|sheet| (sheet.properties.title, sheet.properties.sheet_id))
                        .collect(),
                )
            })
            .await?;
        ids.get(sheet)
            .copied()
            .ok_or_else(|| StoreError::Transport(format!("sheet `{sheet}` does not exist")))
    }
}

/// 1 始まりの列番号を列記号にする（1 -> A, 27 -> AA）
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// データ行 `index`（0 始まり、ヘッダー除く）のシート上の行番号
fn sheet_row(index: usize) -> usize {
    index + 2
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetsApi for HttpSheetsApi {
    async fn read_rows(&self, sheet: &str, width: usize) -> Result<Vec<Row>, StoreError> {
        // スキーマより 1 列広く読んで、はみ出しを検出できるようにする
        let range = format!("{sheet}!A2:{}", column_letter(width + 1));
        let response = self
            .client
            .get(self.values_url(&range))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body: ValueRange = Self::check(response, "values.get").await?.json().await?;
        tracing::debug!(backend = "sheets", sheet, rows = body.values.len(), "read_rows");
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn append_row(&self, sheet: &str, row: Row) -> Result<(), StoreError> {
        let range = format!("{sheet}!A1:{}", column_letter(row.len()));
        let url = format!("{}:append", self.values_url(&range));
        let response = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        Self::check(response, "values.append").await?;
        Ok(())
    }

    async fn update_row(&self, sheet: &str, index: usize, row: Row) -> Result<(), StoreError> {
        let line = sheet_row(index);
        let range = format!("{sheet}!A{line}:{}{line}", column_letter(row.len()));
        let response = self
            .client
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.access_token)
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [row] }))
            .send()
            .await?;
        Self::check(response, "values.update").await?;
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, index: usize) -> Result<(), StoreError> {
        let sheet_id = self.sheet_id(sheet).await?;
        // deleteDimension は 0 始まり・終端排他。ヘッダーが 0 行目
        let start = sheet_row(index) - 1;
        let request = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start,
                        "endIndex": start + 1,
                    }
                }
            }]
        });
        let url = format!("{}/{}:batchUpdate", self.base_url, self.spreadsheet_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;
        Self::check(response, "batchUpdate").await?;
        Ok(())
    }
}
