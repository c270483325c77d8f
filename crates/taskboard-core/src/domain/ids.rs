//! Domain identifiers (strongly-typed IDs).
//!
//! # 文字列ベースの ID + Phantom type
//! バックエンドによって ID の形式が異なります（mock は `TASK-001`、
//! スプレッドシートは `TASK-<ULID>`、ユーザーはメールアドレス）。
//! そのため中身は `String` のまま保持し、マーカー型で種類を区別します。
//!
//! ## Phantom Type パターン
//! `Id<T>` は共通実装を提供し、`T` は実行時には使わないマーカー型です。
//! TaskId と CommentId はコンパイル時に混同できません。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// 新しい ID を生成するときのプレフィックス（"TASK-", "CMT-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    /// 生成時に使うプレフィックス（例: "TASK-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// ```ignore
/// let task_id: TaskId = Id::new("TASK-001");
/// let comment_id: CommentId = Id::new("CMT-001");
/// // task_id と comment_id は異なる型なので、混同できない
/// ```
pub struct Id<T: IdMarker> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// プレフィックス + 任意の本体から ID を作る（例: "TASK-" + "007"）
    pub fn with_prefix(body: impl fmt::Display) -> Self {
        Self::new(format!("{}{}", T::prefix(), body))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// プレフィックスを除いた部分の数値（`TASK-007` -> 7）
    ///
    /// 形式が違う ID（ULID など）は `None`。
    pub fn numeric_suffix(&self) -> Option<u64> {
        self.value
            .strip_prefix(T::prefix())
            .and_then(|rest| rest.parse().ok())
    }
}

// derive だと T にも Clone/Eq などの境界が付いてしまうので手で実装する

impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdMarker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: IdMarker> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskMarker {}

impl IdMarker for TaskMarker {
    fn prefix() -> &'static str {
        "TASK-"
    }
}

/// User のマーカー型（ID はメールアドレスなのでプレフィックスなし）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserMarker {}

impl IdMarker for UserMarker {
    fn prefix() -> &'static str {
        ""
    }
}

/// Category のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryMarker {}

impl IdMarker for CategoryMarker {
    fn prefix() -> &'static str {
        "CAT-"
    }
}

/// Comment のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommentMarker {}

impl IdMarker for CommentMarker {
    fn prefix() -> &'static str {
        "CMT-"
    }
}

// ========================================
// Type Alias（使いやすさのため）
// ========================================

/// Identifier of a Task (assigned by the store on create).
pub type TaskId = Id<TaskMarker>;

/// Identifier of a User (the user's email address).
pub type UserId = Id<UserMarker>;

/// Identifier of a Category.
pub type CategoryId = Id<CategoryMarker>;

/// Identifier of a Comment.
pub type CommentId = Id<CommentMarker>;
