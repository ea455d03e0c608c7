use crate::{ApiError, AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::{AccessTag, User};
use infrastructure::StoreError;
use shared::{AppError, TokenError};
use thiserror::Error;
use tracing::{debug, warn};

/// セッショントークンを運ぶリクエストヘッダー
pub const AUTH_HEADER: &str = "x-auth";

/// 認証済みリクエストに付与されるコンテキスト
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub token: String,
}

/// 認証失敗の内訳（ログ用。クライアントには常に空の 401 を返す）
#[derive(Debug, Error)]
enum AuthFailure {
    #[error("missing x-auth header")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no active session for token")]
    SessionNotFound,
}

/// トークンを検証し、署名だけでなくセッション一覧にトークンが残っていることも確認する
///
/// ログアウト済みのトークンは署名が正しくても拒否される。
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match resolve_session(&state, token).await {
        Ok(context) => {
            debug!(user_id = %context.user.id, "認証成功");
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(AuthFailure::Store(e)) => {
            warn!(error = %e, "認証中にストアエラーが発生しました");
            ApiError(AppError::Unauthorized).into_response()
        }
        Err(reason) => {
            debug!(%reason, "認証失敗");
            ApiError(AppError::Unauthorized).into_response()
        }
    }
}

async fn resolve_session(
    state: &AppState,
    token: Option<String>,
) -> Result<AuthContext, AuthFailure> {
    let token = token.ok_or(AuthFailure::MissingToken)?;

    let user_id = state.tokens.verify(&token)?.user_id()?;
    let user = state
        .users
        .find_by_session(&user_id, &token, AccessTag::Auth)
        .await?
        .ok_or(AuthFailure::SessionNotFound)?;

    Ok(AuthContext { user, token })
}
