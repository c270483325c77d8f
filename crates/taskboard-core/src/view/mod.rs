//! View - タスク一覧から画面ごとの投影を作る純粋関数群
//!
//! - table: フィルタとソート
//! - board: ステータス別の列
//! - timeline: ガントチャートの座標

pub mod board;
pub mod table;
pub mod timeline;

pub use self::board::{Column, group_by_status, plan_move};
pub use self::table::{AssigneeNames, SortDirection, SortKey, TableState, TaskFilter, project};
pub use self::timeline::{Bar, DayHeader, MonthHeader, TimelineLayout};
