// src/db.rs
use crate::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

/// 設定から接続プールを作成
pub async fn create_db_pool(config: &DatabaseConfig) -> Result<DbPool, DbErr> {
    let mut opt = ConnectOptions::new(config.url.clone());

    // 接続オプションを設定
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(config.sqlx_logging);

    // インメモリSQLiteではアイドル切断でDBごと消えるので寿命を設定しない
    if !config.url.starts_with("sqlite:") {
        opt.idle_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(8 * 60));
    }

    Database::connect(opt).await
}

/// ヘルスチェック用の疎通確認
pub async fn ping(conn: &DbPool) -> Result<(), DbErr> {
    conn.ping().await
}
