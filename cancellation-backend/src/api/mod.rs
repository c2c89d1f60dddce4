// src/api/mod.rs
use crate::config::AppConfig;
use crate::logging::{inject_request_context, logging_middleware};
use crate::middleware::auth::{HasIdentityProvider, IdentityProvider};
use crate::service::cancellation_service::CancellationService;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub mod dto;
pub mod handlers;

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub cancellation_service: Arc<CancellationService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        db_pool: DatabaseConnection,
        identity_provider: Arc<dyn IdentityProvider>,
        app_config: &AppConfig,
    ) -> Self {
        Self {
            cancellation_service: Arc::new(CancellationService::new(db_pool.clone())),
            identity_provider,
            db: Arc::new(db_pool),
            config: Arc::new(app_config.clone()),
        }
    }
}

impl HasIdentityProvider for AppState {
    fn identity_provider(&self) -> &dyn IdentityProvider {
        self.identity_provider.as_ref()
    }
}

/// 全ルーターとミドルウェアを組み立てる
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_allowed_origins);

    Router::new()
        .merge(handlers::cancellation_handler::cancellation_router(
            app_state.clone(),
        ))
        .merge(handlers::system_handler::system_router(app_state))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(axum_middleware::from_fn(inject_request_context))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// CORS ミドルウェア設定
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
