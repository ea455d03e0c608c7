//! ToDo の CRUD
//!
//! すべての操作は認証済みユーザーを作成者とする ToDo に限られる。
//! 不正な ID、存在しない ID、他人の ToDo はいずれも空ボディの 404 になる。

use crate::extract::JsonBody;
use crate::models::{CreateTodoRequest, TodoListResponse, TodoResponse, UpdateTodoRequest};
use crate::{ApiError, AppState, AuthContext};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use domain::{Todo, TodoId, TodoPatch};
use shared::AppError;
use tracing::info;

fn parse_todo_id(raw: &str) -> Result<TodoId, ApiError> {
    TodoId::parse(raw).map_err(|_| ApiError(AppError::NotFound))
}

/// POST /todos
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<CreateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    let todo = Todo::new(request.text.as_deref().unwrap_or_default(), auth.user.id)?;
    state.todos.insert(&todo).await?;

    info!(todo_id = %todo.id(), creator = %todo.creator(), "ToDoを作成しました");
    Ok(Json(todo))
}

/// GET /todos
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<TodoListResponse>, ApiError> {
    let todos = state.todos.find_by_creator(&auth.user.id).await?;
    Ok(Json(TodoListResponse { todos }))
}

/// GET /todos/:id
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = state
        .todos
        .find_one(&id, &auth.user.id)
        .await?
        .ok_or(ApiError(AppError::NotFound))?;

    Ok(Json(TodoResponse { todo }))
}

/// DELETE /todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let id = parse_todo_id(&id)?;
    let todo = state
        .todos
        .find_one_and_remove(&id, &auth.user.id)
        .await?
        .ok_or(ApiError(AppError::NotFound))?;

    info!(todo_id = %todo.id(), "ToDoを削除しました");
    Ok(Json(TodoResponse { todo }))
}

/// PATCH /todos/:id
///
/// `completed` が `true` なら完了日時をサーバー時刻で設定し、
/// それ以外は未完了に戻して完了日時を消す。
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    let id = parse_todo_id(&id)?;
    let patch = TodoPatch::new(request.text.as_deref(), request.is_completed(), Utc::now())?;

    let todo = state
        .todos
        .find_one_and_update(&id, &auth.user.id, &patch)
        .await
        .map_err(|e| ApiError(AppError::from(e).into_update_rejection()))?
        .ok_or(ApiError(AppError::NotFound))?;

    info!(todo_id = %todo.id(), completed = todo.completed(), "ToDoを更新しました");
    Ok(Json(TodoResponse { todo }))
}
