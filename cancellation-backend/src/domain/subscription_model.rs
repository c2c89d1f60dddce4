// src/domain/subscription_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    /// 月額（最小通貨単位）
    pub monthly_price: i32,

    pub status: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cancellation_model::Entity")]
    Cancellations,
}

impl Related<super::cancellation_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cancellations.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            status: Set(SubscriptionStatus::Active.to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            // 更新の場合のみ updated_at を更新
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

impl Model {
    pub fn subscription_status(&self) -> Result<SubscriptionStatus, String> {
        self.status.parse()
    }
}

/// サブスクリプションステータス
///
/// このサービスが行う遷移は `Active -> PendingCancellation` のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PendingCancellation,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PendingCancellation => "pending_cancellation",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// ステータス遷移が可能かチェック（同じステータスへの遷移は no-op として許可）
    pub fn can_transition_to(&self, new_status: Self) -> bool {
        match (self, new_status) {
            (current, new) if *current == new => true,
            (SubscriptionStatus::Active, SubscriptionStatus::PendingCancellation) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "pending_cancellation" => Ok(SubscriptionStatus::PendingCancellation),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}
