use domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// フィールド単位のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// アプリケーション全体で使用されるエラー型
///
/// 内部の詳細（ストアのエラーメッセージなど）は `Display` にのみ含め、
/// クライアント向けの [`ErrorResponse`] には載せない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    // 入力エラー
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),

    // 認証エラー
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // リソースエラー（存在しない・他人の所有・不正な ID を区別しない）
    #[error("Resource not found")]
    NotFound,

    // ストアエラー
    #[error("Store error: {0}")]
    Store(String),

    /// PATCH /todos/:id でのストア失敗（既存エンドポイントの慣例で 401）
    #[error("Update rejected: {0}")]
    UpdateRejected(String),

    // システムエラー
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// エラーの重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        AppError::validation(error.field(), error.to_string())
    }
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// ストア失敗を PATCH 用のエラーに読み替える
    pub fn into_update_rejection(self) -> Self {
        match self {
            AppError::Store(message) => AppError::UpdateRejected(message),
            other => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NotFound => "NOT_FOUND",
            AppError::Store(_) => "STORE_ERROR",
            AppError::UpdateRejected(_) => "UPDATE_REJECTED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTPステータスコードを取得
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials | AppError::Store(_) => 400,
            AppError::Unauthorized | AppError::UpdateRejected(_) => 401,
            AppError::NotFound => 404,
            AppError::Internal(_) => 500,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Validation(_) | AppError::NotFound => ErrorSeverity::Info,
            AppError::Unauthorized | AppError::InvalidCredentials => ErrorSeverity::Warning,
            AppError::Store(_) | AppError::UpdateRejected(_) | AppError::Internal(_) => {
                ErrorSeverity::Error
            }
        }
    }

    /// ユーザー向けメッセージを取得
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "request validation failed",
            AppError::Unauthorized => "authentication required",
            AppError::InvalidCredentials => "invalid email or password",
            AppError::NotFound => "not found",
            AppError::Store(_) | AppError::UpdateRejected(_) => "request could not be completed",
            AppError::Internal(_) => "internal server error",
        }
    }

    /// レスポンスボディ（401 と 404 は空ボディ）
    pub fn response_body(&self) -> Option<ErrorResponse> {
        match self {
            AppError::Unauthorized | AppError::NotFound => None,
            _ => Some(ErrorResponse::from_app_error(self)),
        }
    }

    /// 重要度に応じたレベルでログに記録
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Error => {
                tracing::error!(error = %self, code = self.code(), "Request failed");
            }
            ErrorSeverity::Warning => {
                tracing::warn!(code = self.code(), "Request rejected");
            }
            ErrorSeverity::Info => {
                tracing::info!(code = self.code(), "Request rejected");
            }
        }
    }
}

/// 標準化されたエラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        let errors = match error {
            AppError::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };

        Self {
            code: error.code().to_string(),
            message: error.user_message().to_string(),
            errors,
        }
    }
}
