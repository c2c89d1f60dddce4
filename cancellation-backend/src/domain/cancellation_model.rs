// src/domain/cancellation_model.rs

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, Rng};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bバリアントの割引額（最小通貨単位）
pub const DOWNSELL_DISCOUNT: i32 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cancellations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub user_id: Uuid,

    pub subscription_id: Uuid,

    pub downsell_variant: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,

    pub accepted_downsell: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subscription_model::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription_model::Column::Id"
    )]
    Subscription,
}

impl Related<super::subscription_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            accepted_downsell: Set(false),
            created_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    /// 保存済みのバリアント。未知の値は保存時点の不整合なのでエラー
    pub fn variant(&self) -> Result<DownsellVariant, DbErr> {
        self.downsell_variant
            .parse()
            .map_err(DbErr::Type)
    }
}

/// ダウンセルA/Bテストのバリアント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownsellVariant {
    /// 割引オファーなし
    A,
    /// 割引オファーあり
    B,
}

impl DownsellVariant {
    /// OSのCSPRNGから偏りのない1ビットを引いて割り当てる
    pub fn draw() -> Self {
        Self::draw_with(&mut OsRng)
    }

    pub fn draw_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            DownsellVariant::B
        } else {
            DownsellVariant::A
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DownsellVariant::A => "A",
            DownsellVariant::B => "B",
        }
    }

    pub fn offers_discount(&self) -> bool {
        matches!(self, DownsellVariant::B)
    }

    /// Bなら割引後価格（0未満にはしない）、Aなら None
    pub fn downsell_price(&self, monthly_price: i32) -> Option<i32> {
        self.offers_discount()
            .then(|| monthly_price.saturating_sub(DOWNSELL_DISCOUNT).max(0))
    }
}

impl fmt::Display for DownsellVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownsellVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(DownsellVariant::A),
            "B" => Ok(DownsellVariant::B),
            _ => Err(format!("Invalid downsell variant: {}", s)),
        }
    }
}
