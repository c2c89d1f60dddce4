use crate::utils::jwt::{JwtConfig, DEVELOPMENT_SECRET_KEY};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use uuid::Uuid;

/// seed.sql の開発用ユーザーと一致させている
pub const DEFAULT_MOCK_USER_ID: &str = "550e8400-e29b-41d4-a716-446655440001";
pub const DEFAULT_MOCK_USER_EMAIL: &str = "user1@example.com";

/// 現在のユーザーをどう解決するか
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// 固定の開発用ユーザー
    Mock,
    /// `Authorization: Bearer <jwt>`
    Jwt,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(AuthMode::Mock),
            "jwt" => Ok(AuthMode::Jwt),
            other => Err(format!("Invalid AUTH_MODE value: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub mock_user_id: Uuid,
    pub mock_user_email: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub sqlx_logging: bool,
    /// 起動時に未適用のマイグレーションを流す
    pub run_migrations: bool,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok(); // .env ファイルを読み込む (存在しなくてもエラーにしない)

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mode: AuthMode = env::var("AUTH_MODE")
            .unwrap_or_else(|_| "mock".to_string())
            .parse()?;

        let mock_user_id = Uuid::parse_str(
            &env::var("MOCK_USER_ID").unwrap_or_else(|_| DEFAULT_MOCK_USER_ID.to_string()),
        )
        .map_err(|_| "Invalid MOCK_USER_ID value")?;

        // JWTモードでは秘密鍵必須、モックモードでは開発用の鍵で構わない
        let jwt = match mode {
            AuthMode::Jwt => JwtConfig::from_env().map_err(|e| e.to_string())?,
            AuthMode::Mock => JwtConfig::from_env_with_secret(
                env::var("JWT_SECRET_KEY").unwrap_or_else(|_| DEVELOPMENT_SECRET_KEY.to_string()),
            )
            .map_err(|e| e.to_string())?,
        };
        jwt.validate().map_err(|e| e.to_string())?;

        Ok(Self {
            environment,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| "Invalid PORT value")?,
            cors_allowed_origins: parse_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .map_err(|_| "Invalid DB_MAX_CONNECTIONS value")?,
                min_connections: 1,
                connect_timeout_secs: 8,
                sqlx_logging: env::var("DB_SQLX_LOGGING")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
                run_migrations: env::var("RUN_MIGRATIONS")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
            },
            auth: AuthConfig {
                mode,
                mock_user_id,
                mock_user_email: env::var("MOCK_USER_EMAIL")
                    .unwrap_or_else(|_| DEFAULT_MOCK_USER_EMAIL.to_string()),
            },
            jwt,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// テスト用の設定を作成
    pub fn for_testing() -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                // インメモリSQLiteは接続ごとに別DBになるので1本に固定
                max_connections: 1,
                min_connections: 1,
                connect_timeout_secs: 10,
                sqlx_logging: false,
                run_migrations: true,
            },
            auth: AuthConfig {
                mode: AuthMode::Mock,
                mock_user_id: Uuid::parse_str(DEFAULT_MOCK_USER_ID)
                    .unwrap_or_else(|_| Uuid::nil()),
                mock_user_email: DEFAULT_MOCK_USER_EMAIL.to_string(),
            },
            jwt: JwtConfig {
                secret_key: "test-secret-key-that-is-at-least-32-characters-long".to_string(),
                ..JwtConfig::default()
            },
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
