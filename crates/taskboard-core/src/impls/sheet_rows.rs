//! スプレッドシートの列スキーマと行 <-> レコード変換
//!
//! 列は名前ではなく位置で対応付ける。列順はシートのレイアウトとの契約なので、
//! 読み込みと書き込みの両方でここに定義した順番を厳密に守る。
//! 列を増減するときは `SCHEMA_VERSION` を上げること。

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::domain::{Category, Comment, Role, StoreError, Task, User};
use crate::ports::Row;

pub const SCHEMA_VERSION: u32 = 1;

/// 1 枚のシートの列定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl SheetSchema {
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

pub const TASKS: SheetSchema = SheetSchema {
    name: "Tasks",
    columns: &[
        "id",
        "name",
        "description",
        "assignee",
        "category",
        "startDate",
        "dueDate",
        "priority",
        "status",
        "createdAt",
        "updatedAt",
    ],
};

pub const USERS: SheetSchema = SheetSchema {
    name: "Users",
    columns: &["email", "name", "role"],
};

pub const CATEGORIES: SheetSchema = SheetSchema {
    name: "Categories",
    columns: &["id", "name"],
};

pub const COMMENTS: SheetSchema = SheetSchema {
    name: "Comments",
    columns: &["id", "taskId", "userId", "userName", "text", "createdAt"],
};

/// 行とレコードの相互変換
pub trait RowCodec: Sized {
    const SCHEMA: SheetSchema;

    fn to_row(&self) -> Row;

    /// `cells` は必ずスキーマ幅ちょうど（呼び出し側で正規化済み）
    fn from_cells(cells: &[String]) -> Result<Self, String>;
}

/// シートから読んだ行をレコードに変換する
///
/// - スキーマより長い行はエラー
/// - 短い行は空セルで右詰め（Sheets は末尾の空セルを返さない）
/// - 完全に空の行は読み飛ばす
///
/// 戻り値の `usize` は元の行リスト上の位置（書き込み時の行特定に使う）。
pub fn decode_rows<T: RowCodec>(rows: Vec<Row>) -> Result<Vec<(usize, T)>, StoreError> {
    let width = T::SCHEMA.width();
    let mut records = Vec::with_capacity(rows.len());
    for (index, mut row) in rows.into_iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if row.len() > width {
            return Err(malformed::<T>(
                index,
                format!("expected {width} columns, found {}", row.len()),
            ));
        }
        row.resize(width, String::new());
        let record = T::from_cells(&row).map_err(|reason| malformed::<T>(index, reason))?;
        records.push((index, record));
    }
    Ok(records)
}

/// 先頭列（id / email）が一致する行の位置を探す
pub fn locate_row(rows: &[Row], key: &str) -> Option<usize> {
    rows.iter()
        .position(|row| row.first().is_some_and(|cell| cell == key))
}

fn malformed<T: RowCodec>(index: usize, reason: String) -> StoreError {
    StoreError::MalformedRow {
        sheet: T::SCHEMA.name.to_string(),
        // ヘッダー行 + 1 始まり
        row: index + 2,
        reason,
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(column: &str, cell: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(cell.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| format!("{column}: invalid timestamp `{cell}`: {err}"))
}

fn parse_date(column: &str, cell: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(cell.trim(), "%Y-%m-%d")
        .map_err(|err| format!("{column}: invalid date `{cell}`: {err}"))
}

fn required<'a>(column: &str, cell: &'a str) -> Result<&'a str, String> {
    if cell.trim().is_empty() {
        Err(format!("{column} is empty"))
    } else {
        Ok(cell)
    }
}

impl RowCodec for Task {
    const SCHEMA: SheetSchema = TASKS;

    fn to_row(&self) -> Row {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.description.clone(),
            self.assignee.to_string(),
            self.category.clone(),
            self.start_date.format("%Y-%m-%d").to_string(),
            self.due_date.format("%Y-%m-%d").to_string(),
            self.priority.label().to_string(),
            self.status.label().to_string(),
            format_timestamp(&self.created_at),
            format_timestamp(&self.updated_at),
        ]
    }

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        Ok(Task {
            id: required("id", &cells[0])?.into(),
            name: cells[1].clone(),
            description: cells[2].clone(),
            assignee: cells[3].as_str().into(),
            category: cells[4].clone(),
            start_date: parse_date("startDate", &cells[5])?,
            due_date: parse_date("dueDate", &cells[6])?,
            priority: cells[7].parse().map_err(|err| format!("{err}"))?,
            status: cells[8].parse().map_err(|err| format!("{err}"))?,
            created_at: parse_timestamp("createdAt", &cells[9])?,
            updated_at: parse_timestamp("updatedAt", &cells[10])?,
        })
    }
}

impl RowCodec for User {
    const SCHEMA: SheetSchema = USERS;

    fn to_row(&self) -> Row {
        vec![
            self.email.to_string(),
            self.name.clone(),
            self.role.as_str().to_string(),
        ]
    }

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        let role: Role = cells[2].parse().map_err(|err| format!("{err}"))?;
        Ok(User::new(
            required("email", &cells[0])?,
            cells[1].clone(),
            role,
        ))
    }
}

impl RowCodec for Category {
    const SCHEMA: SheetSchema = CATEGORIES;

    fn to_row(&self) -> Row {
        vec![self.id.to_string(), self.name.clone()]
    }

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        Ok(Category::new(required("id", &cells[0])?, cells[1].clone()))
    }
}

impl RowCodec for Comment {
    const SCHEMA: SheetSchema = COMMENTS;

    fn to_row(&self) -> Row {
        vec![
            self.id.to_string(),
            self.task_id.to_string(),
            self.user_id.to_string(),
            self.user_name.clone(),
            self.text.clone(),
            format_timestamp(&self.created_at),
        ]
    }

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        Ok(Comment {
            id: required("id", &cells[0])?.into(),
            task_id: required("taskId", &cells[1])?.into(),
            user_id: cells[2].as_str().into(),
            user_name: cells[3].clone(),
            text: cells[4].clone(),
            created_at: parse_timestamp("createdAt", &cells[5])?,
        })
    }
}
