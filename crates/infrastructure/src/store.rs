use async_trait::async_trait;
use domain::{AccessTag, Email, Todo, TodoId, TodoPatch, User, UserId};
use shared::AppError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 一意制約違反（値はフィールド名）
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateKey(field) => AppError::validation(field, "already in use"),
            other => AppError::Store(other.to_string()),
        }
    }
}

/// ユーザー（資格情報）ストア
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 新規ユーザーを保存する。メールアドレスが既に使われていれば `DuplicateKey("email")`
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// セッション一覧を丸ごと書き換える（比較なしの上書き）
    ///
    /// ユーザーが存在しなければ `None`。
    async fn save_sessions(&self, user: &User) -> Result<Option<User>, StoreError>;

    /// `id` のユーザーのうち、トークン文字列と用途タグの両方が一致する
    /// セッションを持つものを返す
    async fn find_by_session(
        &self,
        id: &UserId,
        token: &str,
        access: AccessTag,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .find_by_id(id)
            .await?
            .filter(|user| user.has_session(token, access)))
    }
}

/// ToDo ストア
///
/// ID を受け取る操作はすべて `(id, creator)` の組で絞り込む。
/// 他人の ToDo は存在しないものと同じに扱われる。
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, todo: &Todo) -> Result<(), StoreError>;

    async fn find_by_creator(&self, creator: &UserId) -> Result<Vec<Todo>, StoreError>;

    async fn find_one(&self, id: &TodoId, creator: &UserId) -> Result<Option<Todo>, StoreError>;

    /// 更新後の ToDo を返す
    async fn find_one_and_update(
        &self,
        id: &TodoId,
        creator: &UserId,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>, StoreError>;

    /// 削除した ToDo を返す
    async fn find_one_and_remove(
        &self,
        id: &TodoId,
        creator: &UserId,
    ) -> Result<Option<Todo>, StoreError>;
}
