//! taskboard-core
//!
//! タスク管理アプリのコア。表・かんばん・ガントの 3 つのビューを、
//! 差し替え可能なストア（モック / スクリプトエンドポイント / スプレッドシート）の上に載せる。
//!
//! # モジュール構成
//! - **domain**: レコード・id・列挙型・セッション・エラー
//! - **ports**: 抽象化レイヤー（TaskStore, SheetsApi, Clock, IdGenerator）
//! - **impls**: ストアの実装（MockTaskStore, RemoteTaskStore, SheetTaskStore など）
//! - **view**: 一覧のフィルタ/ソート、かんばんの列分け、ガントのレイアウト
//! - **app**: Shell（状態管理）と Config（ストアの選択）
//! - **observability**: tracing の初期化

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod view;
