//! TaskStore port - データアクセスアダプタの契約
//!
//! 3 つの実装（mock / remote endpoint / spreadsheet）が同じ契約を満たし、
//! 起動時にどれか 1 つを `Arc<dyn TaskStore>` として選ぶ。
//!
//! # 実装
//! - `impls::MockTaskStore`: メモリ上の配列 + 疑似レイテンシ
//! - `impls::RemoteTaskStore`: `action` 名でパラメータ化された単一 HTTP エンドポイント
//! - `impls::SheetTaskStore`: スプレッドシートの行を位置ベースでマッピング

use async_trait::async_trait;

use crate::domain::{Category, Comment, NewTask, StoreError, Task, TaskId, User, UserId};

/// TaskStore は Task / User / Category / Comment の取得と更新を行う
///
/// # 契約
/// - list 系は副作用なし。失敗は `StoreError::Transport`
/// - `create_task` は新しい id を採番し、`created_at == updated_at` を打刻する
///   （lookup しないので `NotFound` にはならない）
/// - `replace_task` / `delete_task` は id が存在しなければ `NotFound`
/// - `create_comment` は投稿者の表示名をセッションから解決する
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn list_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, StoreError>;

    async fn create_task(&self, fields: NewTask) -> Result<Task, StoreError>;

    /// 全フィールドを置き換え、`updated_at` を新しく打刻して返す
    async fn replace_task(&self, task: Task) -> Result<Task, StoreError>;

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError>;

    async fn create_comment(
        &self,
        task_id: &TaskId,
        author_id: &UserId,
        text: &str,
    ) -> Result<Comment, StoreError>;
}
