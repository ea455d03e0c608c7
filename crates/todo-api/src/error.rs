use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use infrastructure::StoreError;
use shared::{AppError, PasswordHashError, TokenError};

/// ハンドラーから返すエラー
///
/// ステータスコードとボディは [`AppError`] の定義に従う。
/// 401 と 404 はボディを持たない。
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();

        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.0.response_body() {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self(error.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        Self(AppError::Internal(error.to_string()))
    }
}

impl From<PasswordHashError> for ApiError {
    fn from(error: PasswordHashError) -> Self {
        Self(AppError::Internal(error.to_string()))
    }
}
