//! ユーザー登録・ログイン・ログアウト

use crate::extract::JsonBody;
use crate::models::CredentialsRequest;
use crate::{ApiError, AppState, AuthContext, AUTH_HEADER};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use domain::{validate_password, Email, User, UserProfile};
use shared::{check_credentials, generate_auth_token, AppError, PasswordHasher};
use std::sync::Arc;
use tracing::{info, warn};

/// Argon2 は CPU を占有するためブロッキングスレッドで実行する
async fn hash_password(
    hasher: Arc<dyn PasswordHasher>,
    plaintext: String,
) -> Result<String, ApiError> {
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
        .await
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))??;
    Ok(digest)
}

async fn verify_password(
    hasher: Arc<dyn PasswordHasher>,
    user: User,
    plaintext: String,
) -> Result<bool, ApiError> {
    let matched =
        tokio::task::spawn_blocking(move || check_credentials(&user, &plaintext, hasher.as_ref()))
            .await
            .map_err(|e| ApiError(AppError::Internal(e.to_string())))??;
    Ok(matched)
}

/// トークンを発行してセッションを保存し、`x-auth` ヘッダー付きでプロフィールを返す
async fn start_session(
    state: &AppState,
    user: User,
) -> Result<([(&'static str, String); 1], Json<UserProfile>), ApiError> {
    let (user, token) = generate_auth_token(user, &state.tokens)?;
    let saved = state
        .users
        .save_sessions(&user)
        .await?
        .ok_or_else(|| ApiError(AppError::Internal(format!("user {} vanished", user.id))))?;

    Ok(([(AUTH_HEADER, token)], Json(saved.profile())))
}

/// POST /users
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = Email::parse(&request.email)?;
    validate_password(&request.password)?;

    let digest = hash_password(state.hasher.clone(), request.password).await?;
    let user = User::new(email, digest);
    state.users.insert(&user).await?;

    info!(user_id = %user.id, "ユーザーを登録しました");
    start_session(&state, user).await
}

/// POST /users/login
///
/// 未登録のメールアドレスとパスワード不一致は同じ 400 を返す。
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError(AppError::InvalidCredentials);

    let email = Email::parse(&request.email).map_err(|_| invalid())?;
    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password(state.hasher.clone(), user.clone(), request.password).await? {
        warn!(user_id = %user.id, "パスワードが一致しません");
        return Err(invalid());
    }

    info!(user_id = %user.id, "ログインしました");
    start_session(&state, user).await
}

/// GET /users/me
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<UserProfile> {
    Json(auth.user.profile())
}

/// DELETE /users/me/token
///
/// リクエストに使ったトークンのセッションだけを取り除く。他のセッションは有効なまま。
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, ApiError> {
    let user = auth.user.without_token(&auth.token);
    state.users.save_sessions(&user).await?;

    info!(user_id = %user.id, "ログアウトしました");
    Ok(StatusCode::OK)
}
