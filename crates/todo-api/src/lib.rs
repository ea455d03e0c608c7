//! HTTP API（axum）
//!
//! `/health` と `/users` の登録・ログインは認証不要。
//! それ以外のルートは `x-auth` ヘッダーのセッショントークンを要求する。

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use infrastructure::{Stores, TodoStore, UserStore};
use shared::{Argon2Hasher, PasswordHasher, TokenService};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use middleware::{AuthContext, AUTH_HEADER};

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl AppState {
    pub fn new(stores: Stores, tokens: TokenService) -> Self {
        Self {
            users: stores.users,
            todos: stores.todos,
            tokens: Arc::new(tokens),
            hasher: Arc::new(Argon2Hasher),
        }
    }

    /// ハッシュ実装を差し替える（テスト用）
    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }
}

/// ルータを構築して返します。
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/todos",
            get(handlers::todos::list_todos).post(handlers::todos::create_todo),
        )
        .route(
            "/todos/:id",
            get(handlers::todos::get_todo)
                .delete(handlers::todos::delete_todo)
                .patch(handlers::todos::update_todo),
        )
        .route("/users/me", get(handlers::users::me))
        .route("/users/me/token", delete(handlers::users::logout))
        .route_layer(from_fn_with_state(state.clone(), middleware::authenticate));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/users", post(handlers::users::register))
        .route("/users/login", post(handlers::users::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
