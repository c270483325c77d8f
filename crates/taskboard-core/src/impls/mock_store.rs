//! MockTaskStore - メモリ上のモックストア
//!
//! スプレッドシートから取得するはずのデータをメモリ上の配列で再現する。
//! ネットワークを模して、読み込みは 500〜1000ms、書き込みは 500ms 待つ。
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で状態を共有（await をまたいでロックを持たない）
//! - レコードは常に clone して返す（呼び出し側が正本を書き換えられない）

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;

use crate::domain::{
    Category, Comment, CommentId, NewTask, Session, StoreError, Task, TaskId, User, UserId,
};
use crate::ports::{Clock, TaskStore};

/// 疑似ネットワーク遅延の設定
#[derive(Debug, Clone)]
pub struct Latency {
    /// 読み込み時の待ち時間（ミリ秒、範囲からランダム）
    pub read_ms: RangeInclusive<u64>,
    /// 書き込み時の待ち時間（ミリ秒）
    pub write_ms: u64,
}

impl Latency {
    pub fn network() -> Self {
        Self {
            read_ms: 500..=1000,
            write_ms: 500,
        }
    }

    pub fn none() -> Self {
        Self {
            read_ms: 0..=0,
            write_ms: 0,
        }
    }

    fn read_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.read_ms.clone());
        Duration::from_millis(ms)
    }

    fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::network()
    }
}

#[derive(Debug, Default)]
struct MockState {
    tasks: Vec<Task>,
    users: Vec<User>,
    categories: Vec<Category>,
    comments: Vec<Comment>,
}

impl MockState {
    /// 既存 ID の最大番号 + 1 を 3 桁ゼロ埋めで採番（`TASK-007`）
    fn next_task_id(&self) -> TaskId {
        let max = self
            .tasks
            .iter()
            .filter_map(|task| task.id.numeric_suffix())
            .max()
            .unwrap_or(0);
        TaskId::with_prefix(format_args!("{:03}", max + 1))
    }

    fn next_comment_id(&self) -> CommentId {
        let max = self
            .comments
            .iter()
            .filter_map(|comment| comment.id.numeric_suffix())
            .max()
            .unwrap_or(0);
        CommentId::with_prefix(format_args!("{:03}", max + 1))
    }
}

pub struct MockTaskStore {
    state: Arc<Mutex<MockState>>,
    session: Session,
    clock: Arc<dyn Clock>,
    latency: Latency,
}

impl MockTaskStore {
    /// 空のストア
    pub fn empty(session: Session, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            session,
            clock,
            latency: Latency::default(),
        }
    }

    /// サンプルデータ入りのストア
    pub fn with_sample_data(session: Session, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let state = MockState {
            tasks: serde_json::from_str(SAMPLE_TASKS)?,
            users: serde_json::from_str(SAMPLE_USERS)?,
            categories: serde_json::from_str(SAMPLE_CATEGORIES)?,
            comments: Vec::new(),
        };
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            session,
            clock,
            latency: Latency::default(),
        })
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.simulate(self.latency.read_delay()).await;
        let state = self.state.lock().await;
        tracing::debug!(backend = "mock", count = state.tasks.len(), "list_tasks");
        Ok(state.tasks.clone())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.simulate(self.latency.read_delay()).await;
        Ok(self.state.lock().await.users.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.simulate(self.latency.read_delay()).await;
        Ok(self.state.lock().await.categories.clone())
    }

    async fn list_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, StoreError> {
        self.simulate(self.latency.read_delay()).await;
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .filter(|comment| &comment.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn create_task(&self, fields: NewTask) -> Result<Task, StoreError> {
        self.simulate(self.latency.write_delay()).await;
        let mut state = self.state.lock().await;
        let task = Task::from_new(state.next_task_id(), fields, self.clock.now());
        tracing::debug!(backend = "mock", task_id = %task.id, "create_task");
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn replace_task(&self, task: Task) -> Result<Task, StoreError> {
        self.simulate(self.latency.write_delay()).await;
        let mut state = self.state.lock().await;
        let Some(slot) = state.tasks.iter_mut().find(|t| t.id == task.id) else {
            tracing::warn!(backend = "mock", task_id = %task.id, "replace_task: not found");
            return Err(StoreError::task_not_found(task.id.as_str()));
        };
        *slot = Task {
            updated_at: self.clock.now(),
            ..task
        };
        tracing::debug!(backend = "mock", task_id = %slot.id, "replace_task");
        Ok(slot.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError> {
        self.simulate(self.latency.write_delay()).await;
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state.tasks.retain(|task| &task.id != id);
        if state.tasks.len() == before {
            tracing::warn!(backend = "mock", task_id = %id, "delete_task: not found");
            return Err(StoreError::task_not_found(id.as_str()));
        }
        tracing::debug!(backend = "mock", task_id = %id, "delete_task");
        Ok(true)
    }

    async fn create_comment(
        &self,
        task_id: &TaskId,
        author_id: &UserId,
        text: &str,
    ) -> Result<Comment, StoreError> {
        self.simulate(self.latency.write_delay()).await;
        let mut state = self.state.lock().await;
        let comment = Comment {
            id: state.next_comment_id(),
            task_id: task_id.clone(),
            user_id: author_id.clone(),
            user_name: self.session.display_name_for(author_id),
            text: text.to_string(),
            created_at: self.clock.now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}

const SAMPLE_TASKS: &str = r#"[
  { "id": "TASK-001", "name": "UI設計の完了", "description": "Figmaでメイン画面のUIデザインを完成させる。", "assignee": "user1@example.com", "category": "デザイン", "startDate": "2023-10-01", "dueDate": "2023-10-05", "priority": "高", "status": "完了", "createdAt": "2023-10-01T10:00:00Z", "updatedAt": "2023-10-05T15:00:00Z" },
  { "id": "TASK-002", "name": "APIエンドポイント実装", "description": "タスク取得用のAPIを作成する。", "assignee": "user2@example.com", "category": "バックエンド", "startDate": "2023-10-06", "dueDate": "2023-10-10", "priority": "高", "status": "進行中", "createdAt": "2023-10-02T11:00:00Z", "updatedAt": "2023-10-08T14:00:00Z" },
  { "id": "TASK-003", "name": "テーブル表示コンポーネント作成", "description": "Reactでタスク一覧を表示するコンポーネントを実装。", "assignee": "user1@example.com", "category": "フロントエンド", "startDate": "2023-10-08", "dueDate": "2023-10-12", "priority": "中", "status": "進行中", "createdAt": "2023-10-03T12:00:00Z", "updatedAt": "2023-10-09T18:00:00Z" },
  { "id": "TASK-004", "name": "ユーザー認証機能の調査", "description": "OAuth 2.0を利用した認証方法を調査する。", "assignee": "user3@example.com", "category": "インフラ", "startDate": "2023-10-11", "dueDate": "2023-10-15", "priority": "低", "status": "未着手", "createdAt": "2023-10-04T13:00:00Z", "updatedAt": "2023-10-04T13:00:00Z" },
  { "id": "TASK-005", "name": "単体テストの実装", "description": "APIの単体テストをJestで記述する。", "assignee": "user2@example.com", "category": "テスト", "startDate": "2023-10-13", "dueDate": "2023-10-18", "priority": "中", "status": "未着手", "createdAt": "2023-10-05T14:00:00Z", "updatedAt": "2023-10-05T14:00:00Z" },
  { "id": "TASK-006", "name": "かんばんボードUIの実装", "description": "ドラッグ＆ドロップ機能を実装する。", "assignee": "user1@example.com", "category": "フロントエンド", "startDate": "2023-10-14", "dueDate": "2023-10-20", "priority": "高", "status": "未着手", "createdAt": "2023-10-06T15:00:00Z", "updatedAt": "2023-10-06T15:00:00Z" }
]"#;

const SAMPLE_USERS: &str = r#"[
  { "email": "user1@example.com", "name": "Taro Yamada", "role": "admin" },
  { "email": "user2@example.com", "name": "Hanako Suzuki", "role": "member" },
  { "email": "user3@example.com", "name": "Jiro Tanaka", "role": "member" }
]"#;

const SAMPLE_CATEGORIES: &str = r#"[
  { "id": "CAT-1", "name": "デザイン" },
  { "id": "CAT-2", "name": "バックエンド" },
  { "id": "CAT-3", "name": "フロントエンド" },
  { "id": "CAT-4", "name": "インフラ" },
  { "id": "CAT-5", "name": "テスト" }
]"#;
