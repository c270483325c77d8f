//! Session - サインイン中のユーザー
//!
//! グローバル変数ではなく、Shell とストアに明示的に渡すコンテキスト値。

use super::ids::UserId;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.email
    }

    /// コメント投稿者の表示名を解決する
    ///
    /// セッションのユーザー本人ならその名前、それ以外は ID をそのまま使う。
    pub fn display_name_for(&self, author: &UserId) -> String {
        if author == &self.user.email {
            self.user.name.clone()
        } else {
            author.to_string()
        }
    }
}
