//! Board - かんばんの列分け
//!
//! 列は Status の宣言順で固定。フィルタ前の全タスクを対象にする。

use serde::Serialize;

use crate::domain::{Status, Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column<'a> {
    pub status: Status,
    /// 入力順
    pub tasks: Vec<&'a Task>,
}

impl Column<'_> {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

pub fn group_by_status(tasks: &[Task]) -> [Column<'_>; 3] {
    Status::ALL.map(|status| Column {
        status,
        tasks: tasks.iter().filter(|task| task.status == status).collect(),
    })
}

/// ドロップ先の列に移した結果のタスクを返す
///
/// タスクが見つからない、または既にその状態なら None（書き込み不要）。
pub fn plan_move(tasks: &[Task], id: &TaskId, status: Status) -> Option<Task> {
    tasks
        .iter()
        .find(|task| &task.id == id)
        .filter(|task| task.status != status)
        .map(|task| task.with_status(status))
}
