//! RemoteTaskStore - スクリプトエンドポイント経由のストア
//!
//! 1 つの URL を `action` 名でパラメータ化して使う。
//! - 読み込み: `GET {base}?action=getTasks`
//! - 書き込み: `POST {base}` + JSON `{ "action": ..., "payload": ... }`
//! - レスポンス: `{ "success": bool, "data"?: any, "message"?: string }`
//!
//! HTTP エラー（非 2xx、接続失敗）は `Transport`、`success:false` は
//! アプリケーションレベルの失敗として `Rejected` に分けて返す。

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Category, Comment, NewTask, Session, StoreError, Task, TaskId, User, UserId,
};
use crate::ports::TaskStore;

/// エンドポイントの action 名
pub mod actions {
    pub const GET_TASKS: &str = "getTasks";
    pub const GET_USERS: &str = "getUsers";
    pub const GET_CATEGORIES: &str = "getCategories";
    pub const GET_COMMENTS: &str = "getComments";
    pub const ADD_TASK: &str = "addTask";
    pub const UPDATE_TASK: &str = "updateTask";
    pub const DELETE_TASK: &str = "deleteTask";
    pub const ADD_COMMENT: &str = "addComment";
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct RequestEnvelope<'a, P> {
    action: &'a str,
    payload: P,
}

#[derive(Debug, Clone)]
pub struct RemoteTaskStore {
    client: Client,
    base_url: String,
    session: Session,
}

impl RemoteTaskStore {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>, StoreError> {
        let mut query = vec![("action", action)];
        query.extend_from_slice(params);
        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .inspect_err(|err| tracing::warn!(backend = "remote", action, %err, "request failed"))?;
        Self::unwrap_envelope(action, response).await
    }

    async fn post<P: Serialize, T: DeserializeOwned>(
        &self,
        action: &str,
        payload: P,
    ) -> Result<Option<T>, StoreError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&RequestEnvelope { action, payload })
            .send()
            .await
            .inspect_err(|err| tracing::warn!(backend = "remote", action, %err, "request failed"))?;
        Self::unwrap_envelope(action, response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        action: &str,
        response: Response,
    ) -> Result<Option<T>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(backend = "remote", action, %status, "non-success status");
            return Err(StoreError::Transport(format!(
                "`{action}` returned HTTP {status}: {body}"
            )));
        }
        let envelope: ResponseEnvelope<T> = response.json().await?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "unknown error".to_string());
            tracing::warn!(backend = "remote", action, %message, "request rejected");
            return Err(StoreError::Rejected {
                action: action.to_string(),
                message,
            });
        }
        tracing::debug!(backend = "remote", action, "ok");
        Ok(envelope.data)
    }

    fn require<T>(action: &str, data: Option<T>) -> Result<T, StoreError> {
        data.ok_or_else(|| StoreError::Decode(format!("`{action}` response has no data")))
    }
}

/// `success:false` のうち "not found" を含むものは NotFound として扱う
fn not_found_from_rejection(err: StoreError, id: &TaskId) -> StoreError {
    match err {
        StoreError::Rejected { ref message, .. }
            if message.to_lowercase().contains("not found") =>
        {
            StoreError::task_not_found(id.as_str())
        }
        other => other,
    }
}

#[async_trait]
impl TaskStore for RemoteTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .get(actions::GET_TASKS, &[])
            .await?
            .unwrap_or_default())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self
            .get(actions::GET_USERS, &[])
            .await?
            .unwrap_or_default())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self
            .get(actions::GET_CATEGORIES, &[])
            .await?
            .unwrap_or_default())
    }

    async fn list_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .get(actions::GET_COMMENTS, &[("taskId", task_id.as_str())])
            .await?
            .unwrap_or_default())
    }

    async fn create_task(&self, fields: NewTask) -> Result<Task, StoreError> {
        let data = self.post(actions::ADD_TASK, &fields).await?;
        Self::require(actions::ADD_TASK, data)
    }

    async fn replace_task(&self, task: Task) -> Result<Task, StoreError> {
        let data = self
            .post(actions::UPDATE_TASK, &task)
            .await
            .map_err(|err| not_found_from_rejection(err, &task.id))?;
        Self::require(actions::UPDATE_TASK, data)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<bool, StoreError> {
        self.post::<_, serde_json::Value>(actions::DELETE_TASK, json!({ "id": id }))
            .await
            .map_err(|err| not_found_from_rejection(err, id))?;
        Ok(true)
    }

    async fn create_comment(
        &self,
        task_id: &TaskId,
        author_id: &UserId,
        text: &str,
    ) -> Result<Comment, StoreError> {
        let payload = json!({
            "taskId": task_id,
            "userId": author_id,
            "userName": self.session.display_name_for(author_id),
            "text": text,
        });
        let data = self.post(actions::ADD_COMMENT, payload).await?;
        Self::require(actions::ADD_COMMENT, data)
    }
}
