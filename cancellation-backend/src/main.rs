// src/main.rs
use cancellation_backend::api::{build_router, AppState};
use cancellation_backend::config::AppConfig;
use cancellation_backend::db::create_db_pool;
use cancellation_backend::logging::init_tracing;
use cancellation_backend::middleware::auth::identity_provider_from_config;
use cancellation_backend::utils::jwt::JwtManager;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // トレーシングの設定
    init_tracing();

    tracing::info!("Starting Cancellation Backend server...");

    // 設定を読み込む
    let app_config = AppConfig::from_env()?;
    tracing::info!(
        environment = %app_config.environment,
        auth_mode = ?app_config.auth.mode,
        "Configuration loaded"
    );

    // データベース接続を作成
    let db_pool = create_db_pool(&app_config.database).await?;
    tracing::info!("Database pool created successfully.");

    if app_config.database.run_migrations {
        Migrator::up(&db_pool, None).await?;
        tracing::info!("Database migrations applied.");
    }

    // 認証プロバイダーの作成
    let jwt_manager = Arc::new(JwtManager::new(app_config.jwt.clone())?);
    let identity_provider = identity_provider_from_config(&app_config.auth, jwt_manager);
    tracing::info!(provider = identity_provider.name(), "Identity provider configured");

    // ルーターの設定
    let app_state = Arc::new(AppState::new(db_pool, identity_provider, &app_config));
    let app_router = build_router(app_state);

    // サーバーの起動
    let server_addr = app_config.server_addr();
    tracing::info!("Router configured. Server listening on {}", server_addr);

    let listener = TcpListener::bind(&server_addr).await?;
    axum::serve(listener, app_router.into_make_service()).await?;

    Ok(())
}
