// tests/common/test_data.rs

use cancellation_backend::domain::subscription_model::{self, SubscriptionStatus};
use cancellation_backend::repository::subscription_repository::{
    CreateSubscription, SubscriptionRepository,
};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// 開発用シードと同じモックユーザー
pub fn mock_user_id() -> Uuid {
    Uuid::parse_str(cancellation_backend::config::DEFAULT_MOCK_USER_ID).unwrap()
}

/// `days_ago` 日前に作成された active のサブスクリプションを作成
pub async fn create_subscription(
    db: &DatabaseConnection,
    user_id: Uuid,
    monthly_price: i32,
    days_ago: i64,
) -> subscription_model::Model {
    SubscriptionRepository::new(db.clone())
        .create(CreateSubscription {
            user_id,
            monthly_price,
            status: SubscriptionStatus::Active,
            created_at: Some(Utc::now() - Duration::days(days_ago)),
        })
        .await
        .unwrap()
}
