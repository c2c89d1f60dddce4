// src/api/handlers/cancellation_handler.rs

use crate::api::dto::cancellation_dto::{
    DownsellOfferDto, SubmitCancellationDto, SubmitCancellationResponseDto,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::extractors::JsonBody;
use crate::middleware::auth::CurrentUser;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

// --- ハンドラー関数 ---

/// 割り当て済みのダウンセルバリアントを返す（未割り当てならここで抽選）
pub async fn get_cancellation_handler(
    State(app_state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<DownsellOfferDto>> {
    let offer = app_state
        .cancellation_service
        .get_or_assign_variant(user.id)
        .await?;
    Ok(Json(offer))
}

/// 解約の試行・確定を記録する
///
/// 認証はボディの検証より先に行う（未認証ならボディは読まない）。
pub async fn submit_cancellation_handler(
    State(app_state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<SubmitCancellationDto>,
) -> AppResult<Json<SubmitCancellationResponseDto>> {
    let response = app_state
        .cancellation_service
        .submit_cancellation(user.id, payload)
        .await?;
    Ok(Json(response))
}

// --- ルーター ---

pub fn cancellation_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/cancellations",
            get(get_cancellation_handler).post(submit_cancellation_handler),
        )
        .with_state(app_state)
}
