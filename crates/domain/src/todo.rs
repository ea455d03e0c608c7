use crate::{DomainError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ToDo ID（ULID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// パスパラメータなどから ToDo ID を復元する
    ///
    /// ULID として解釈できない文字列はエラー。
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        ulid::Ulid::from_string(id)
            .map(|ulid| Self(ulid.to_string()))
            .map_err(|_| DomainError::InvalidTodoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        ulid::Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_text(raw: &str) -> Result<String, DomainError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DomainError::InvalidText("text cannot be empty".to_string()));
    }
    Ok(text.to_string())
}

/// ミリ秒精度に丸める（ワイヤ形式がミリ秒のため）
fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// ToDo
///
/// `completed` は `completed_at` の有無から決まるため、
/// 「完了なら完了日時あり、未完了なら完了日時なし」が常に成り立つ。
/// 作成者は作成後に変更できない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TodoDocument", try_from = "TodoDocument")]
pub struct Todo {
    id: TodoId,
    text: String,
    completed_at: Option<DateTime<Utc>>,
    creator: UserId,
}

impl Todo {
    /// 未完了の ToDo を作成する
    pub fn new(text: &str, creator: UserId) -> Result<Self, DomainError> {
        Ok(Self {
            id: TodoId::new(),
            text: normalize_text(text)?,
            completed_at: None,
            creator,
        })
    }

    /// 永続化された値から復元する
    pub fn from_parts(
        id: TodoId,
        text: &str,
        completed_at: Option<DateTime<Utc>>,
        creator: UserId,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            text: normalize_text(text)?,
            completed_at: completed_at.map(truncate_to_millis),
            creator,
        })
    }

    pub fn id(&self) -> &TodoId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn creator(&self) -> &UserId {
        &self.creator
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.creator == user_id
    }

    /// 部分更新を適用した ToDo を返す
    pub fn apply_patch(mut self, patch: &TodoPatch) -> Self {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        self.completed_at = patch.completed_at;
        self
    }
}

/// PATCH で受け付ける更新内容
///
/// 受け付けるのは `text` と `completed` のみ。完了日時は常にサーバーが決める:
/// `completed` が `true` なら `now`、それ以外は未完了に戻して完了日時を消す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPatch {
    text: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

impl TodoPatch {
    pub fn new(text: Option<&str>, completed: bool, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let text = text.map(normalize_text).transpose()?;
        let completed_at = completed.then(|| truncate_to_millis(now));
        Ok(Self { text, completed_at })
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

/// ワイヤ形式（`_id` / `text` / `completed` / `completedAt` / `_creator`）
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: TodoId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_creator")]
    creator: UserId,
}

impl From<Todo> for TodoDocument {
    fn from(todo: Todo) -> Self {
        Self {
            completed: todo.completed(),
            id: todo.id,
            text: todo.text,
            completed_at: todo.completed_at,
            creator: todo.creator,
        }
    }
}

impl TryFrom<TodoDocument> for Todo {
    type Error = DomainError;

    fn try_from(doc: TodoDocument) -> Result<Self, Self::Error> {
        if doc.completed != doc.completed_at.is_some() {
            return Err(DomainError::InconsistentTodo(format!(
                "completed={} but completedAt={:?}",
                doc.completed, doc.completed_at
            )));
        }
        Todo::from_parts(doc.id, &doc.text, doc.completed_at, doc.creator)
    }
}
