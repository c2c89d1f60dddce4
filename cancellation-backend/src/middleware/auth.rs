// src/middleware/auth.rs

use crate::config::{AuthConfig, AuthMode};
use crate::error::AppError;
use crate::utils::jwt::{JwtError, JwtManager};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// リクエストを送ってきたユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// 現在のユーザーを解決する
///
/// 解決できなければ None を返し、ハンドラー側で 401 になる。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, parts: &Parts) -> Option<CurrentUser>;

    fn name(&self) -> &'static str;
}

/// 常に同じユーザーを返す開発用プロバイダー
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    user: Option<CurrentUser>,
}

impl MockIdentityProvider {
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        Self {
            user: Some(CurrentUser { id, email }),
        }
    }

    /// 誰もログインしていない状態
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn current_user(&self, _parts: &Parts) -> Option<CurrentUser> {
        self.user.clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// `Authorization: Bearer <jwt>` からユーザーを解決する
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    jwt_manager: Arc<JwtManager>,
}

impl JwtIdentityProvider {
    pub fn new(jwt_manager: Arc<JwtManager>) -> Self {
        Self { jwt_manager }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn current_user(&self, parts: &Parts) -> Option<CurrentUser> {
        let token = extract_bearer_token(parts)?;

        let claims = self
            .jwt_manager
            .verify_access_token(token)
            .map_err(|e| match e {
                JwtError::TokenExpired => debug!("Access token expired"),
                other => warn!(error = %other, "Invalid access token"),
            })
            .ok()?;

        let id = claims
            .user_id()
            .map_err(|_| warn!(sub = %claims.sub, "Access token subject is not a user id"))
            .ok()?;

        Some(CurrentUser {
            id,
            email: claims.email,
        })
    }

    fn name(&self) -> &'static str {
        "jwt"
    }
}

/// Authorization ヘッダーからトークンを取得
fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 設定に応じたプロバイダーを作成
pub fn identity_provider_from_config(
    auth: &AuthConfig,
    jwt_manager: Arc<JwtManager>,
) -> Arc<dyn IdentityProvider> {
    match auth.mode {
        AuthMode::Mock => Arc::new(MockIdentityProvider::new(
            auth.mock_user_id,
            Some(auth.mock_user_email.clone()),
        )),
        AuthMode::Jwt => Arc::new(JwtIdentityProvider::new(jwt_manager)),
    }
}

/// ステートからプロバイダーを取り出すためのトレイト
pub trait HasIdentityProvider {
    fn identity_provider(&self) -> &dyn IdentityProvider;
}

impl<T: HasIdentityProvider> HasIdentityProvider for Arc<T> {
    fn identity_provider(&self) -> &dyn IdentityProvider {
        (**self).identity_provider()
    }
}

// --- Axum Extractors ---

impl<S> FromRequestParts<S> for CurrentUser
where
    S: HasIdentityProvider + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider = state.identity_provider();
        provider.current_user(parts).await.ok_or_else(|| {
            warn!(
                provider = provider.name(),
                path = %parts.uri.path(),
                "Unauthenticated request"
            );
            AppError::Unauthenticated
        })
    }
}
