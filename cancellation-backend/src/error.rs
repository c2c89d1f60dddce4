// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NoSubscription(String),

    /// ストアの読み書き失敗。メッセージはそのままクライアントへ返す
    #[error("{0}")]
    StoreError(#[from] DbErr),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::NoSubscription(_) => StatusCode::BAD_REQUEST,
            AppError::StoreError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::BadRequest(_) => "bad_request",
            AppError::NoSubscription(_) => "no_subscription",
            AppError::StoreError(_) => "store_error",
            AppError::InternalServerError(_) => "internal_server_error",
        }
    }
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "Request failed");
        } else {
            tracing::warn!(error = %self, error_type = self.error_type(), "Request rejected");
        }

        let error = match &self {
            // 設定やトランザクション周りの詳細は外に出さない
            AppError::InternalServerError(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error,
            error_type: self.error_type().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_type: String,
}
