//! Domain model (ids, records, session, errors).
//!
//! すべてのレコードは値として受け渡す。コレクションの正本は Shell が持つ。

pub mod comment;
pub mod errors;
pub mod ids;
pub mod session;
pub mod task;
pub mod user;

pub use self::comment::Comment;
pub use self::errors::StoreError;
pub use self::ids::{CategoryId, CommentId, Id, IdMarker, TaskId, UserId};
pub use self::session::Session;
pub use self::task::{NewTask, ParseEnumError, Priority, Status, Task};
pub use self::user::{Category, Role, User};
