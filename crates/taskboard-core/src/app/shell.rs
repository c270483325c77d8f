//! Shell - セッション中のタスク・ユーザー・カテゴリの正本を持つ
//!
//! 状態遷移は `Idle → Loading → (Ready | Error)`。読み込みと変更操作のたびに
//! Loading に戻る。ストアの結果が返ってきてから手元のコレクションを更新する
//! （楽観的更新はしない）。失敗した操作はコレクションを変えない。
//!
//! # 実装
//! - 状態は tokio::sync::Mutex に置き、ストア呼び出しの await 中はロックを持たない
//! - そのため操作同士は排他されず、同じタスクへの同時編集は後勝ちになる
//! - 変更後に全件を取り直すことはせず、返ってきた 1 件を id で差し替える

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::domain::{
    Category, Comment, NewTask, Session, Status, StoreError, Task, TaskId, User, UserId,
};
use crate::ports::TaskStore;
use crate::view::{
    AssigneeNames, Column, TableState, TaskFilter, TimelineLayout, group_by_status, plan_move,
    project,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    /// 表示用のメッセージ
    Error(String),
}

impl Phase {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Phase::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Table,
    Kanban,
    Gantt,
}

/// 保存フォームの中身
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    New(NewTask),
    Existing(Task),
}

/// Shell の境界で利用者に見せるエラー
///
/// Display は表示用の文言だけ。ストアのエラーは source として残す。
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Failed to load data. Please try again later.")]
    Load(#[source] StoreError),

    #[error("Failed to save task.")]
    Save(#[source] StoreError),

    #[error("Failed to delete task.")]
    Delete(#[source] StoreError),

    #[error("Failed to update task status.")]
    UpdateStatus(#[source] StoreError),

    #[error("Failed to load comments.")]
    LoadComments(#[source] StoreError),

    #[error("Failed to post comment.")]
    PostComment(#[source] StoreError),
}

impl ShellError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            ShellError::Load(err)
            | ShellError::Save(err)
            | ShellError::Delete(err)
            | ShellError::UpdateStatus(err)
            | ShellError::LoadComments(err)
            | ShellError::PostComment(err) => err,
        }
    }
}

#[derive(Debug, Default)]
struct ShellState {
    phase: Phase,
    view: View,
    tasks: Vec<Task>,
    users: Vec<User>,
    categories: Vec<Category>,
    comments: HashMap<TaskId, Vec<Comment>>,
}

impl ShellState {
    fn fail(&mut self, err: ShellError) -> ShellError {
        tracing::warn!(error = %err.store_error(), "{err}");
        self.phase = Phase::Error(err.to_string());
        err
    }

    /// id が一致するものを差し替え、なければ末尾に追加
    fn reconcile(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
        self.phase = Phase::Ready;
    }
}

/// ある時点の状態のコピー（各ビューの投影はここから作る）
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: Phase,
    pub view: View,
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    current_user: UserId,
}

impl Snapshot {
    pub fn table(&self, filter: &TaskFilter, state: &TableState) -> Vec<&Task> {
        project(&self.tasks, filter, state, &self.current_user)
    }

    pub fn board(&self) -> [Column<'_>; 3] {
        group_by_status(&self.tasks)
    }

    pub fn timeline(&self, today: NaiveDate) -> TimelineLayout {
        TimelineLayout::compute(&self.tasks, today)
    }

    pub fn assignee_names(&self) -> AssigneeNames {
        AssigneeNames::new(&self.users)
    }
}

pub struct Shell {
    store: Arc<dyn TaskStore>,
    session: Session,
    state: Mutex<ShellState>,
}

impl Shell {
    pub fn new(store: Arc<dyn TaskStore>, session: Session) -> Self {
        Self {
            store,
            session,
            state: Mutex::new(ShellState::default()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase.clone()
    }

    pub async fn view(&self) -> View {
        self.state.lock().await.view
    }

    pub async fn set_view(&self, view: View) {
        self.state.lock().await.view = view;
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn users(&self) -> Vec<User> {
        self.state.lock().await.users.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.lock().await.categories.clone()
    }

    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot {
            phase: state.phase.clone(),
            view: state.view,
            tasks: state.tasks.clone(),
            users: state.users.clone(),
            categories: state.categories.clone(),
            current_user: self.session.user_id().clone(),
        }
    }

    async fn enter_loading(&self) {
        self.state.lock().await.phase = Phase::Loading;
    }

    /// タスク・ユーザー・カテゴリを並行に読み込む
    pub async fn load(&self) -> Result<(), ShellError> {
        self.enter_loading().await;
        let result = tokio::try_join!(
            self.store.list_tasks(),
            self.store.list_users(),
            self.store.list_categories(),
        );

        let mut state = self.state.lock().await;
        match result {
            Ok((tasks, users, categories)) => {
                tracing::info!(
                    tasks = tasks.len(),
                    users = users.len(),
                    categories = categories.len(),
                    "loaded"
                );
                state.tasks = tasks;
                state.users = users;
                state.categories = categories;
                state.phase = Phase::Ready;
                Ok(())
            }
            Err(source) => Err(state.fail(ShellError::Load(source))),
        }
    }

    /// 新規なら作成、既存なら全体を置き換える
    pub async fn save(&self, draft: Draft) -> Result<Task, ShellError> {
        self.enter_loading().await;
        let result = match draft {
            Draft::New(fields) => self.store.create_task(fields).await,
            Draft::Existing(task) => self.store.replace_task(task).await,
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(task) => {
                tracing::debug!(task_id = %task.id, "saved");
                state.reconcile(task.clone());
                Ok(task)
            }
            Err(source) => Err(state.fail(ShellError::Save(source))),
        }
    }

    pub async fn delete(&self, id: &TaskId) -> Result<(), ShellError> {
        self.enter_loading().await;
        let result = self.store.delete_task(id).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(_) => {
                state.tasks.retain(|task| &task.id != id);
                state.comments.remove(id);
                state.phase = Phase::Ready;
                tracing::debug!(task_id = %id, "deleted");
                Ok(())
            }
            Err(source) => Err(state.fail(ShellError::Delete(source))),
        }
    }

    /// かんばんでの列移動
    ///
    /// 状態が変わらない、または手元にないタスクならストアを呼ばずに `Ok(None)`。
    pub async fn move_task(&self, id: &TaskId, status: Status) -> Result<Option<Task>, ShellError> {
        let planned = {
            let state = self.state.lock().await;
            plan_move(&state.tasks, id, status)
        };
        let Some(task) = planned else {
            tracing::debug!(task_id = %id, %status, "move skipped");
            return Ok(None);
        };

        self.enter_loading().await;
        let result = self.store.replace_task(task).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(task) => {
                tracing::debug!(task_id = %task.id, status = %task.status, "moved");
                state.reconcile(task.clone());
                Ok(Some(task))
            }
            Err(source) => Err(state.fail(ShellError::UpdateStatus(source))),
        }
    }

    /// コメントをストアから取り直してキャッシュする
    ///
    /// コメントはタスク詳細の中だけで使うので Phase は変えない。
    pub async fn comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, ShellError> {
        let comments = self.store.list_comments(task_id).await.map_err(|source| {
            tracing::warn!(task_id = %task_id, error = %source, "list_comments failed");
            ShellError::LoadComments(source)
        })?;
        self.state
            .lock()
            .await
            .comments
            .insert(task_id.clone(), comments.clone());
        Ok(comments)
    }

    pub async fn cached_comments(&self, task_id: &TaskId) -> Vec<Comment> {
        self.state
            .lock()
            .await
            .comments
            .get(task_id)
            .cloned()
            .unwrap_or_default()
    }

    /// セッションのユーザーとしてコメントを投稿する
    pub async fn add_comment(&self, task_id: &TaskId, text: &str) -> Result<Comment, ShellError> {
        let comment = self
            .store
            .create_comment(task_id, self.session.user_id(), text)
            .await
            .map_err(|source| {
                tracing::warn!(task_id = %task_id, error = %source, "create_comment failed");
                ShellError::PostComment(source)
            })?;
        self.state
            .lock()
            .await
            .comments
            .entry(task_id.clone())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, Role};
    use crate::impls::{Latency, MockTaskStore};
    use crate::ports::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn session() -> Session {
        Session::new(User::new("user1@example.com", "Taro Yamada", Role::Admin))
    }

    fn mock() -> MockTaskStore {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ));
        MockTaskStore::with_sample_data(session(), clock)
            .unwrap()
            .with_latency(Latency::none())
    }

    /// 書き込み回数を数え、フラグが立っている間は全呼び出しを失敗させる
    struct Flaky {
        inner: MockTaskStore,
        failing: AtomicBool,
        writes: AtomicUsize,
    }

    impl Flaky {
        fn new() -> Self {
            Self {
                inner: mock(),
                failing: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
            }
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Transport("connection refused".into()))
            } else {
                Ok(())
            }
        }

        fn write(&self) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.check()
        }
    }

    #[async_trait]
    impl TaskStore for Flaky {
        async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
            self.check()?;
            self.inner.list_tasks().await
        }
        async fn list_users(&self) -> Result<Vec<User>, StoreError> {
            self.check()?;
            self.inner.list_users().await
        }
        async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
            self.check()?;
            self.inner.list_categories().await
        }
        async fn list_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, StoreError> {
            self.check()?;
            self.inner.list_comments(task_id).await
        }
        async fn create_task(&self, fields: NewTask) -> Result<Task, StoreError> {
            self.write()?;
            self.inner.create_task(fields).await
        }
        async fn replace_task(&self, task: Task) -> Result<Task, StoreError> {
            self.write()?;
            self.inner.replace_task(task).await
        }
        async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError> {
            self.write()?;
            self.inner.delete_task(id).await
        }
        async fn create_comment(
            &self,
            task_id: &TaskId,
            author_id: &UserId,
            text: &str,
        ) -> Result<Comment, StoreError> {
            self.write()?;
            self.inner.create_comment(task_id, author_id, text).await
        }
    }

    async fn loaded() -> (Shell, Arc<Flaky>) {
        let store = Arc::new(Flaky::new());
        let shell = Shell::new(store.clone(), session());
        shell.load().await.unwrap();
        (shell, store)
    }

    fn new_task(name: &str) -> NewTask {
        NewTask {
            name: name.into(),
            priority: Priority::High,
            ..NewTask::draft(
                UserId::new("user2@example.com"),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            )
        }
    }

    #[tokio::test]
    async fn starts_idle_and_load_becomes_ready() {
        let shell = Shell::new(Arc::new(mock()), session());
        assert_eq!(shell.phase().await, Phase::Idle);
        assert_eq!(shell.view().await, View::Table);

        shell.load().await.unwrap();

        assert_eq!(shell.phase().await, Phase::Ready);
        assert_eq!(shell.tasks().await.len(), 6);
        assert_eq!(shell.users().await.len(), 3);
        assert_eq!(shell.categories().await.len(), 5);
    }

    #[tokio::test]
    async fn set_view_is_reflected_in_snapshot() {
        let (shell, _) = loaded().await;

        shell.set_view(View::Gantt).await;
        assert_eq!(shell.view().await, View::Gantt);
        assert_eq!(shell.snapshot().await.view, View::Gantt);

        shell.set_view(View::Kanban).await;
        assert_eq!(shell.view().await, View::Kanban);
        assert_eq!(shell.tasks().await.len(), 6);
    }

    #[tokio::test]
    async fn failed_load_sets_error_message() {
        let store = Arc::new(Flaky::new());
        store.failing.store(true, Ordering::SeqCst);
        let shell = Shell::new(store, session());

        let err = shell.load().await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to load data. Please try again later.");
        assert!(matches!(err.store_error(), StoreError::Transport(_)));
        assert_eq!(
            shell.phase().await.error_message(),
            Some("Failed to load data. Please try again later.")
        );
        assert!(shell.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn created_task_appears_once_with_adapter_fields() {
        let (shell, store) = loaded().await;

        let created = shell.save(Draft::New(new_task("リリース"))).await.unwrap();

        let tasks = shell.tasks().await;
        assert_eq!(tasks.iter().filter(|t| t.id == created.id).count(), 1);
        assert_eq!(tasks.last(), Some(&created));
        assert_eq!(created.created_at, created.updated_at);

        // ストアから読み直しても同じ
        let listed = store.list_tasks().await.unwrap();
        assert_eq!(listed.iter().find(|t| t.id == created.id), Some(&created));
    }

    #[tokio::test]
    async fn replace_is_reconciled_in_place() {
        let (shell, _) = loaded().await;
        let mut task = shell.tasks().await[2].clone();
        task.name = "renamed".into();

        let saved = shell.save(Draft::Existing(task.clone())).await.unwrap();

        let tasks = shell.tasks().await;
        assert_eq!(tasks.len(), 6);
        assert_eq!(tasks[2], saved);
        assert_eq!(tasks[2].name, "renamed");
        assert_eq!(shell.phase().await, Phase::Ready);
    }

    #[tokio::test]
    async fn failed_save_leaves_collection_unchanged() {
        let (shell, store) = loaded().await;
        let before = shell.tasks().await;
        store.failing.store(true, Ordering::SeqCst);

        let err = shell.save(Draft::New(new_task("x"))).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to save task.");
        assert_eq!(shell.tasks().await, before);
        assert_eq!(shell.phase().await, Phase::Error("Failed to save task.".into()));
    }

    #[tokio::test]
    async fn delete_removes_locally_after_success_only() {
        let (shell, _) = loaded().await;
        let id = TaskId::new("TASK-004");

        shell.delete(&id).await.unwrap();
        assert!(shell.tasks().await.iter().all(|t| t.id != id));

        let before = shell.tasks().await;
        let err = shell.delete(&id).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete task.");
        assert!(err.store_error().is_not_found());
        assert_eq!(shell.tasks().await, before);
    }

    #[tokio::test]
    async fn move_to_same_status_skips_the_store() {
        let (shell, store) = loaded().await;
        let id = TaskId::new("TASK-002");

        let moved = shell.move_task(&id, Status::InProgress).await.unwrap();

        assert_eq!(moved, None);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn move_changes_only_status() {
        let (shell, store) = loaded().await;
        let id = TaskId::new("TASK-002");
        let before = shell.tasks().await[1].clone();

        let moved = shell.move_task(&id, Status::Done).await.unwrap().unwrap();

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(moved.status, Status::Done);
        assert_eq!(moved.name, before.name);
        assert_eq!(moved.created_at, before.created_at);
        let snapshot = shell.snapshot().await;
        let [_, doing, done] = snapshot.board();
        assert!(doing.tasks.iter().all(|t| t.id != id));
        assert!(done.tasks.iter().any(|t| t.id == id));
    }

    #[tokio::test]
    async fn failed_move_reports_status_message() {
        let (shell, store) = loaded().await;
        store.failing.store(true, Ordering::SeqCst);

        let err = shell
            .move_task(&TaskId::new("TASK-001"), Status::NotStarted)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to update task status.");
        assert_eq!(shell.tasks().await[0].status, Status::Done);
    }

    #[tokio::test]
    async fn concurrent_saves_both_apply() {
        let (shell, _) = loaded().await;

        let (a, b) = tokio::join!(
            shell.save(Draft::New(new_task("a"))),
            shell.save(Draft::New(new_task("b"))),
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.id, b.id);
        assert_eq!(shell.tasks().await.len(), 8);
    }

    #[tokio::test]
    async fn comments_are_authored_by_session_user() {
        let (shell, _) = loaded().await;
        let id = TaskId::new("TASK-001");

        assert!(shell.comments(&id).await.unwrap().is_empty());
        let comment = shell.add_comment(&id, "LGTM").await.unwrap();

        assert_eq!(comment.user_id.as_str(), "user1@example.com");
        assert_eq!(comment.user_name, "Taro Yamada");
        assert_eq!(shell.cached_comments(&id).await, vec![comment.clone()]);
        assert_eq!(shell.comments(&id).await.unwrap(), vec![comment]);
    }

    #[tokio::test]
    async fn snapshot_projections_use_session_user() {
        let (shell, _) = loaded().await;
        let snapshot = shell.snapshot().await;

        let mine = snapshot.table(
            &TaskFilter {
                mine_only: true,
                ..Default::default()
            },
            &TableState::default(),
        );
        let ids: Vec<&str> = mine.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["TASK-006", "TASK-003", "TASK-001"]);

        let layout = snapshot.timeline(NaiveDate::from_ymd_opt(2023, 10, 10).unwrap());
        assert_eq!(layout.start, NaiveDate::from_ymd_opt(2023, 9, 29).unwrap());
        assert_eq!(layout.end, NaiveDate::from_ymd_opt(2023, 10, 22).unwrap());
        assert_eq!(layout.bars.len(), 6);

        assert_eq!(
            snapshot.assignee_names().display(&UserId::new("user2@example.com")),
            "Hanako Suzuki"
        );
    }
}
