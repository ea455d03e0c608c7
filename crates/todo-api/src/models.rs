//! リクエスト / レスポンスの DTO

use domain::Todo;
use serde::{Deserialize, Serialize};

/// POST /todos リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// PATCH /todos/:id リクエスト
///
/// 受け付けるのは `text` と `completed` のみ。`_id` や `_creator` など
/// その他のフィールドは読み捨てる。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<serde_json::Value>,
}

impl UpdateTodoRequest {
    /// 真偽値の `true` のときだけ完了扱い（文字列 "true" や 1 は未完了）
    pub fn is_completed(&self) -> bool {
        matches!(self.completed, Some(serde_json::Value::Bool(true)))
    }
}

/// POST /users, POST /users/login リクエスト
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// GET /todos レスポンス
#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
}

/// GET / PATCH / DELETE /todos/:id レスポンス
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// サービスの簡易ステータス
    pub status: &'static str,
}
