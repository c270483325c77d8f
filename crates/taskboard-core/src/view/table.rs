//! Table - 一覧表示のフィルタとソート
//!
//! フィルタはすべて AND で合成する（適用順に依存しない）。
//! ソートは `slice::sort_by` の安定ソートで、降順は比較関数を反転するだけ。
//! 同じキーの行は入力順のまま残る。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::{ParseEnumError, Status, Task, User, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// 名前・説明・id への部分一致（大文字小文字を区別しない）
    pub search: String,
    pub assignee: Option<UserId>,
    pub status: Option<Status>,
    /// 自分の担当だけ
    pub mine_only: bool,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, current_user: &UserId) -> bool {
        self.matches_search(task)
            && self.assignee.as_ref().is_none_or(|a| &task.assignee == a)
            && self.status.is_none_or(|s| task.status == s)
            && (!self.mine_only || &task.assignee == current_user)
    }

    fn matches_search(&self, task: &Task) -> bool {
        let needle = self.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [task.name.as_str(), task.description.as_str(), task.id.as_str()]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Name,
    Description,
    Assignee,
    Category,
    StartDate,
    DueDate,
    Priority,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Description => a.description.cmp(&b.description),
            SortKey::Assignee => a.assignee.cmp(&b.assignee),
            SortKey::Category => a.category.cmp(&b.category),
            SortKey::StartDate => a.start_date.cmp(&b.start_date),
            SortKey::DueDate => a.due_date.cmp(&b.due_date),
            SortKey::Priority => a.priority.cmp(&b.priority),
            SortKey::Status => a.status.cmp(&b.status),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Description => "description",
            SortKey::Assignee => "assignee",
            SortKey::Category => "category",
            SortKey::StartDate => "startDate",
            SortKey::DueDate => "dueDate",
            SortKey::Priority => "priority",
            SortKey::Status => "status",
            SortKey::CreatedAt => "createdAt",
            SortKey::UpdatedAt => "updatedAt",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.trim() {
            "id" => SortKey::Id,
            "name" => SortKey::Name,
            "description" => SortKey::Description,
            "assignee" => SortKey::Assignee,
            "category" => SortKey::Category,
            "startDate" | "start-date" | "start" => SortKey::StartDate,
            "dueDate" | "due-date" | "due" => SortKey::DueDate,
            "priority" => SortKey::Priority,
            "status" => SortKey::Status,
            "createdAt" | "created-at" | "created" => SortKey::CreatedAt,
            "updatedAt" | "updated-at" | "updated" => SortKey::UpdatedAt,
            other => return Err(ParseEnumError::new("sort key", other)),
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// 一覧の並び順（既定は作成日時の新しい順）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl TableState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// 列見出しのクリック: 同じキーなら向きを反転、別のキーなら昇順で選択
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = self.key.compare(a, b);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// フィルタしてからソートした参照の列を返す
pub fn project<'a>(
    tasks: &'a [Task],
    filter: &TaskFilter,
    state: &TableState,
    current_user: &UserId,
) -> Vec<&'a Task> {
    let mut rows: Vec<&Task> = tasks
        .iter()
        .filter(|task| filter.matches(task, current_user))
        .collect();
    rows.sort_by(|a, b| state.compare(a, b));
    rows
}

/// 担当者のメールアドレスから表示名を引く（知らないアドレスはそのまま）
#[derive(Debug, Clone, Default)]
pub struct AssigneeNames {
    names: HashMap<UserId, String>,
}

impl AssigneeNames {
    pub fn new(users: &[User]) -> Self {
        Self {
            names: users
                .iter()
                .map(|user| (user.email.clone(), user.name.clone()))
                .collect(),
        }
    }

    pub fn display<'a>(&'a self, assignee: &'a UserId) -> &'a str {
        self.names
            .get(assignee)
            .map(String::as_str)
            .unwrap_or(assignee.as_str())
    }
}
