use crate::error::AppError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const INVALID_JSON_MESSAGE: &str = "invalid json";

/// JSONボディ Extractor
///
/// 構文エラー・型不一致・Content-Type 欠落はすべて 400 `invalid json` にまとめる。
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!(reason = %rejection_reason(&rejection), "Rejected request body");
                Err(AppError::BadRequest(INVALID_JSON_MESSAGE.to_string()))
            }
        }
    }
}

fn rejection_reason(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "missing json content type".to_string(),
        other => other.body_text(),
    }
}
