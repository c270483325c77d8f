//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（モック、スクリプトエンドポイント、
//! スプレッドシート）へのインターフェースで、実装の詳細を隠蔽する。

pub mod clock;
pub mod id_generator;
pub mod sheets;
pub mod task_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::sheets::{Row, SheetsApi};
pub use self::task_store::TaskStore;
