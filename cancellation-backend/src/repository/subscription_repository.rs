// src/repository/subscription_repository.rs

use crate::domain::subscription_model::{
    self, ActiveModel as SubscriptionActiveModel, Entity as SubscriptionEntity,
    SubscriptionStatus,
};
use chrono::{DateTime, Utc};
use sea_orm::entity::*;
use sea_orm::{ConnectionTrait, DbConn, DbErr, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    db: DbConn,
}

impl SubscriptionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// IDでサブスクリプションを検索
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<subscription_model::Model>, DbErr> {
        SubscriptionEntity::find_by_id(id).one(&self.db).await
    }

    /// 指定ユーザーが所有するサブスクリプションだけを検索
    pub async fn find_owned_by_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<subscription_model::Model>, DbErr> {
        SubscriptionEntity::find_by_id(id)
            .filter(subscription_model::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// ユーザーの最新（created_at が最も新しい）サブスクリプション
    pub async fn find_latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<subscription_model::Model>, DbErr> {
        SubscriptionEntity::find()
            .filter(subscription_model::Column::UserId.eq(user_id))
            .order_by_desc(subscription_model::Column::CreatedAt)
            .one(&self.db)
            .await
    }

    /// サブスクリプションを作成（通常は課金システム側で作られる。シードやテスト用）
    pub async fn create(
        &self,
        create_subscription: CreateSubscription,
    ) -> Result<subscription_model::Model, DbErr> {
        let now = Utc::now();
        let new_subscription = SubscriptionActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(create_subscription.user_id),
            monthly_price: Set(create_subscription.monthly_price),
            status: Set(create_subscription.status.to_string()),
            created_at: Set(create_subscription.created_at.unwrap_or(now)),
            updated_at: Set(now),
        };

        new_subscription.insert(&self.db).await
    }

    /// ステータスを pending_cancellation にする（トランザクション内からも呼べる）
    ///
    /// 存在しないIDは `DbErr::RecordNotFound`。遷移できないステータス（cancelled）の
    /// 場合は何も書き換えずにそのまま返す。
    pub async fn mark_pending_cancellation<C>(
        conn: &C,
        id: Uuid,
    ) -> Result<subscription_model::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let subscription = SubscriptionEntity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("subscription {} not found", id)))?;

        let current = subscription
            .subscription_status()
            .map_err(DbErr::Custom)?;
        if !current.can_transition_to(SubscriptionStatus::PendingCancellation) {
            tracing::warn!(
                subscription_id = %id,
                status = %current,
                "Subscription cannot move to pending_cancellation, leaving status unchanged"
            );
            return Ok(subscription);
        }

        let mut active_model: SubscriptionActiveModel = subscription.into();
        active_model.status = Set(SubscriptionStatus::PendingCancellation.to_string());
        // updated_at は before_save で更新される
        active_model.update(conn).await
    }
}

/// サブスクリプション作成用構造体
#[derive(Debug)]
pub struct CreateSubscription {
    pub user_id: Uuid,
    pub monthly_price: i32,
    pub status: SubscriptionStatus,
    pub created_at: Option<DateTime<Utc>>,
}
