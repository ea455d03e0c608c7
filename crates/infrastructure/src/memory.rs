use crate::{StoreError, TodoStore, UserStore};
use async_trait::async_trait;
use domain::{Email, Todo, TodoId, TodoPatch, User, UserId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

/// 簡易な InMemory 実装（開発/テスト用）
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<UserId, User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        if users.contains_key(&user.id) {
            return Err(StoreError::DuplicateKey("_id".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users)?.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users)?
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn save_sessions(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut users = lock(&self.users)?;
        Ok(users.get_mut(&user.id).map(|stored| {
            stored.sessions = user.sessions.clone();
            stored.clone()
        }))
    }
}

/// 簡易な InMemory 実装（開発/テスト用）
#[derive(Default)]
pub struct InMemoryTodoStore {
    // 作成順を保つ
    todos: Mutex<Vec<Todo>>,
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn insert(&self, todo: &Todo) -> Result<(), StoreError> {
        let mut todos = lock(&self.todos)?;
        if todos.iter().any(|existing| existing.id() == todo.id()) {
            return Err(StoreError::DuplicateKey("_id".to_string()));
        }
        todos.push(todo.clone());
        Ok(())
    }

    async fn find_by_creator(&self, creator: &UserId) -> Result<Vec<Todo>, StoreError> {
        Ok(lock(&self.todos)?
            .iter()
            .filter(|todo| todo.is_owned_by(creator))
            .cloned()
            .collect())
    }

    async fn find_one(&self, id: &TodoId, creator: &UserId) -> Result<Option<Todo>, StoreError> {
        Ok(lock(&self.todos)?
            .iter()
            .find(|todo| todo.id() == id && todo.is_owned_by(creator))
            .cloned())
    }

    async fn find_one_and_update(
        &self,
        id: &TodoId,
        creator: &UserId,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = lock(&self.todos)?;
        let Some(slot) = todos
            .iter_mut()
            .find(|todo| todo.id() == id && todo.is_owned_by(creator))
        else {
            return Ok(None);
        };

        *slot = slot.clone().apply_patch(patch);
        Ok(Some(slot.clone()))
    }

    async fn find_one_and_remove(
        &self,
        id: &TodoId,
        creator: &UserId,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = lock(&self.todos)?;
        let position = todos
            .iter()
            .position(|todo| todo.id() == id && todo.is_owned_by(creator));
        Ok(position.map(|index| todos.remove(index)))
    }
}
