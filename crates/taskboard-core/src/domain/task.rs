//! Task record and its enums.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{TaskId, UserId};

/// 優先度
///
/// 宣言順（High < Medium < Low）がそのままソート順になる。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    #[serde(rename = "高", alias = "High")]
    High,
    #[default]
    #[serde(rename = "中", alias = "Medium")]
    Medium,
    #[serde(rename = "低", alias = "Low")]
    Low,
}

impl Priority {
    /// シートや API 上の表記
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "高",
            Priority::Medium => "中",
            Priority::Low => "低",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "高" | "High" | "high" => Ok(Priority::High),
            "中" | "Medium" | "medium" => Ok(Priority::Medium),
            "低" | "Low" | "low" => Ok(Priority::Low),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

/// ステータス
///
/// かんばんの列順もこの宣言順。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    #[serde(rename = "未着手", alias = "NotStarted")]
    NotStarted,
    #[serde(rename = "進行中", alias = "InProgress")]
    InProgress,
    #[serde(rename = "完了", alias = "Done")]
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Done];

    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "未着手",
            Status::InProgress => "進行中",
            Status::Done => "完了",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "未着手" | "NotStarted" | "not-started" | "todo" => Ok(Status::NotStarted),
            "進行中" | "InProgress" | "in-progress" | "doing" => Ok(Status::InProgress),
            "完了" | "Done" | "done" => Ok(Status::Done),
            other => Err(ParseEnumError::new("status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Task record.
///
/// id とタイムスタンプはストア側で採番・打刻される。
/// `start_date <= due_date` は書き込み時には検証しない（表示側で clamp）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub assignee: UserId,
    pub category: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// NewTask に id と作成時刻を付けて Task にする（created_at == updated_at）
    pub fn from_new(id: TaskId, fields: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            assignee: fields.assignee,
            category: fields.category,
            start_date: fields.start_date,
            due_date: fields.due_date,
            priority: fields.priority,
            status: fields.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// 状態だけ変えたコピー
    pub fn with_status(&self, status: Status) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Task without store-assigned fields (id, createdAt, updatedAt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub assignee: UserId,
    pub category: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: Status,
}

impl NewTask {
    /// 新規作成フォームの初期値（開始日 = 今日、優先度 = 中、未着手）
    pub fn draft(assignee: UserId, today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            assignee,
            category: String::new(),
            start_date: today,
            due_date: today,
            priority: Priority::default(),
            status: Status::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Task {
        let now = "2023-10-01T10:00:00Z".parse().unwrap();
        Task::from_new(
            TaskId::new("TASK-001"),
            NewTask {
                name: "UI設計の完了".into(),
                description: "Figmaでメイン画面のUIデザインを完成させる。".into(),
                assignee: UserId::new("user1@example.com"),
                category: "デザイン".into(),
                start_date: NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2023, 10, 5).unwrap(),
                priority: Priority::High,
                status: Status::Done,
            },
            now,
        )
    }

    #[test]
    fn json_uses_camel_case_and_japanese_labels() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["startDate"], "2023-10-01");
        assert_eq!(value["dueDate"], "2023-10-05");
        assert_eq!(value["priority"], "高");
        assert_eq!(value["status"], "完了");
        assert_eq!(value["createdAt"], value["updatedAt"]);
    }

    #[test]
    fn json_accepts_english_aliases() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["priority"] = "Low".into();
        value["status"] = "InProgress".into();

        let task: Task = serde_json::from_value(value).unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.status, Status::InProgress);
    }

    #[rstest]
    #[case::japanese("進行中", Status::InProgress)]
    #[case::english("Done", Status::Done)]
    #[case::cli_style("not-started", Status::NotStarted)]
    fn status_parses_labels(#[case] input: &str, #[case] expected: Status) {
        assert_eq!(input.parse::<Status>().unwrap(), expected);
    }

    #[test]
    fn labels_pad_to_the_requested_width() {
        assert_eq!(format!("{:<4}|", Status::Done), "完了  |");
        assert_eq!(format!("{:>3}", Priority::High), "  高");
        assert_eq!(format!("{:<6}|", Status::InProgress), "進行中   |");
    }

    #[test]
    fn unknown_priority_is_an_error() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority `urgent`");
    }

    #[test]
    fn with_status_keeps_other_fields() {
        let task = sample();
        let moved = task.with_status(Status::InProgress);

        assert_eq!(moved.status, Status::InProgress);
        assert_eq!(moved.id, task.id);
        assert_eq!(moved.updated_at, task.updated_at);
    }
}
