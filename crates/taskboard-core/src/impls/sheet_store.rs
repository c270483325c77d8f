//! SheetTaskStore - スプレッドシートをデータベースとして使うストア
//!
//! 更新・削除は「全行を読む → id で行番号を探す → その行を書く/消す」の
//! 2 回の呼び出しになる。トランザクションではないので、間に他のセッションが
//! 前の行を消すと行番号がずれる可能性がある（既知の競合、対策なし）。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound;

use crate::domain::{
    Category, Comment, NewTask, Session, StoreError, Task, TaskId, User, UserId,
};
use crate::impls::sheet_rows::{self, RowCodec, decode_rows, locate_row};
use crate::ports::{Clock, IdGenerator, SheetsApi, TaskStore, UlidGenerator};

pub struct SheetTaskStore<S> {
    sheets: S,
    session: Session,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl<S: SheetsApi> SheetTaskStore<S> {
    pub fn new(sheets: S, session: Session, clock: Arc<dyn Clock>) -> Self {
        let ids = Box::new(UlidGenerator::new(clock.clone()));
        Self {
            sheets,
            session,
            clock,
            ids,
        }
    }

    pub fn sheets(&self) -> &S {
        &self.sheets
    }

    async fn read_all<T: RowCodec>(&self) -> Result<Vec<T>, StoreError> {
        let rows = self
            .sheets
            .read_rows(T::SCHEMA.name, T::SCHEMA.width())
            .await?;
        Ok(decode_rows::<T>(rows)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// 行番号を探す（書き込み前の 1 回目の呼び出し）
    async fn locate_task(&self, id: &TaskId) -> Result<usize, StoreError> {
        let rows = self
            .sheets
            .read_rows(sheet_rows::TASKS.name, sheet_rows::TASKS.width())
            .await?;
        locate_row(&rows, id.as_str()).ok_or_else(|| {
            tracing::warn!(backend = "sheets", task_id = %id, "task row not found");
            StoreError::task_not_found(id.as_str())
        })
    }

    /// シートにはミリ秒までしか書かないので、返す値もそこで切り捨てる
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now().trunc_subsecs(3)
    }
}

#[async_trait]
impl<S: SheetsApi> TaskStore for SheetTaskStore<S> {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.read_all::<Task>().await?;
        tracing::debug!(backend = "sheets", count = tasks.len(), "list_tasks");
        Ok(tasks)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.read_all::<User>().await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.read_all::<Category>().await
    }

    async fn list_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, StoreError> {
        let mut comments = self.read_all::<Comment>().await?;
        comments.retain(|comment| &comment.task_id == task_id);
        Ok(comments)
    }

    async fn create_task(&self, fields: NewTask) -> Result<Task, StoreError> {
        let task = Task::from_new(self.ids.generate_task_id(), fields, self.now());
        self.sheets
            .append_row(sheet_rows::TASKS.name, task.to_row())
            .await?;
        tracing::debug!(backend = "sheets", task_id = %task.id, "create_task");
        Ok(task)
    }

    async fn replace_task(&self, task: Task) -> Result<Task, StoreError> {
        let index = self.locate_task(&task.id).await?;
        let stored = Task {
            updated_at: self.now(),
            ..task
        };
        self.sheets
            .update_row(sheet_rows::TASKS.name, index, stored.to_row())
            .await?;
        tracing::debug!(backend = "sheets", task_id = %stored.id, row = index, "replace_task");
        Ok(stored)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError> {
        let index = self.locate_task(id).await?;
        self.sheets
            .delete_row(sheet_rows::TASKS.name, index)
            .await?;
        tracing::debug!(backend = "sheets", task_id = %id, row = index, "delete_task");
        Ok(true)
    }

    async fn create_comment(
        &self,
        task_id: &TaskId,
        author_id: &UserId,
        text: &str,
    ) -> Result<Comment, StoreError> {
        let comment = Comment {
            id: self.ids.generate_comment_id(),
            task_id: task_id.clone(),
            user_id: author_id.clone(),
            user_name: self.session.display_name_for(author_id),
            text: text.to_string(),
            created_at: self.now(),
        };
        self.sheets
            .append_row(sheet_rows::COMMENTS.name, comment.to_row())
            .await?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, Role, Status};
    use crate::impls::InMemorySheets;
    use crate::ports::FixedClock;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn session() -> Session {
        Session::new(User::new("user1@example.com", "Taro Yamada", Role::Admin))
    }

    fn store(sheets: InMemorySheets) -> SheetTaskStore<InMemorySheets> {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
        ));
        SheetTaskStore::new(sheets, session(), clock)
    }

    fn new_task(name: &str) -> NewTask {
        NewTask {
            name: name.into(),
            description: "説明".into(),
            assignee: UserId::new("user2@example.com"),
            category: "テスト".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            priority: Priority::Medium,
            status: Status::NotStarted,
        }
    }

    #[tokio::test]
    async fn created_task_reads_back_identically() {
        let store = store(InMemorySheets::new());

        let created = store.create_task(new_task("a")).await.unwrap();
        let listed = store.list_tasks().await.unwrap();

        assert_eq!(listed, vec![created.clone()]);
        assert!(created.id.as_str().starts_with("TASK-"));
        let rows = store.sheets().rows("Tasks").await;
        let row = &rows[0];
        assert_eq!(row.len(), 11);
        assert_eq!(row[0], created.id.as_str());
        assert_eq!(row[9], "2024-03-01T08:30:00.000Z");
    }

    #[tokio::test]
    async fn replace_writes_the_located_row_only() {
        let store = store(InMemorySheets::new());
        let first = store.create_task(new_task("first")).await.unwrap();
        let second = store.create_task(new_task("second")).await.unwrap();

        let updated = store
            .replace_task(second.with_status(Status::Done))
            .await
            .unwrap();

        let listed = store.list_tasks().await.unwrap();
        assert_eq!(listed, vec![first, updated.clone()]);
        assert_eq!(updated.status, Status::Done);
    }

    #[tokio::test]
    async fn replaced_task_reads_back_with_every_field() {
        let store = store(InMemorySheets::new());
        let created = store.create_task(new_task("before")).await.unwrap();
        let edited = Task {
            name: "after".into(),
            description: "複数行の\n説明, カンマ付き".into(),
            assignee: UserId::new("user3@example.com"),
            category: "デザイン".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            priority: Priority::High,
            status: Status::InProgress,
            ..created.clone()
        };

        let replaced = store.replace_task(edited.clone()).await.unwrap();

        assert_eq!(
            replaced,
            Task {
                updated_at: replaced.updated_at,
                ..edited
            }
        );
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(store.list_tasks().await.unwrap(), vec![replaced]);
    }

    #[tokio::test]
    async fn delete_shifts_following_rows() {
        let store = store(InMemorySheets::new());
        let first = store.create_task(new_task("first")).await.unwrap();
        let second = store.create_task(new_task("second")).await.unwrap();

        assert!(store.delete_task(&first.id).await.unwrap());

        assert_eq!(store.list_tasks().await.unwrap(), vec![second]);
        assert!(store.delete_task(&first.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn users_and_categories_map_by_position() {
        let sheets = InMemorySheets::new()
            .with_rows(
                "Users",
                vec![vec!["user1@example.com".into(), "Taro Yamada".into(), "admin".into()]],
            )
            .with_rows("Categories", vec![vec!["CAT-1".into(), "デザイン".into()]]);
        let store = store(sheets);

        let users = store.list_users().await.unwrap();
        let categories = store.list_categories().await.unwrap();

        assert_eq!(users[0].role, Role::Admin);
        assert_eq!(categories[0].name, "デザイン");
    }

    #[tokio::test]
    async fn comments_are_filtered_by_task() {
        let store = store(InMemorySheets::new());
        let a = TaskId::new("TASK-A");
        let b = TaskId::new("TASK-B");
        let author = UserId::new("user1@example.com");

        let on_a = store.create_comment(&a, &author, "one").await.unwrap();
        store.create_comment(&b, &author, "two").await.unwrap();

        assert_eq!(store.list_comments(&a).await.unwrap(), vec![on_a.clone()]);
        assert_eq!(on_a.user_name, "Taro Yamada");
    }
}
