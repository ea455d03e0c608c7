use crate::models::HealthResponse;
use axum::{http::StatusCode, response::IntoResponse, Json};

/// ヘルスチェック用ハンドラ
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
