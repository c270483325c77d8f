//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **MockTaskStore**: メモリ上のモック（疑似レイテンシ付き）
//! - **RemoteTaskStore**: action 名で呼び分ける HTTP エンドポイント
//! - **SheetTaskStore**: スプレッドシートを DB として使う
//! - **HttpSheetsApi** / **InMemorySheets**: SheetsApi の本番用 / 開発用

pub mod inmem_sheets;
pub mod mock_store;
pub mod remote_store;
pub mod sheet_rows;
pub mod sheet_store;
pub mod sheets_http;

// 主要な型を再エクスポート
pub use self::inmem_sheets::InMemorySheets;
pub use self::mock_store::{Latency, MockTaskStore};
pub use self::remote_store::RemoteTaskStore;
pub use self::sheet_rows::{RowCodec, SCHEMA_VERSION, SheetSchema};
pub use self::sheet_store::SheetTaskStore;
pub use self::sheets_http::HttpSheetsApi;
