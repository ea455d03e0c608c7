use crate::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use shared::AppError;

/// JSON ボディ抽出子
///
/// 不正な JSON や Content-Type の欠落を axum 標準の拒否レスポンスではなく
/// `body` フィールドのバリデーションエラー（400）として返す。
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(AppError::validation("body", rejection.body_text()).into()),
        }
    }
}
