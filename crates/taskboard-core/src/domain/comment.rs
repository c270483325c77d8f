//! Comments (append-only, owned by exactly one task).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, TaskId, UserId};

/// Comment record.
///
/// `user_name` は作成時点の表示名をそのまま保存する（非正規化）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
