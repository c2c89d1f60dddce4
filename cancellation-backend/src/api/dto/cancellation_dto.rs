// src/api/dto/cancellation_dto.rs

use crate::domain::cancellation_model::DownsellVariant;
use serde::{Deserialize, Serialize};

// --- Request DTOs ---

/// `POST /cancellations` のリクエストボディ
///
/// すべて任意項目。`subscription_id` は検証できなければ無視して最新の契約を使う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCancellationDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_downsell: Option<bool>,

    /// true のときだけ解約を確定する
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
}

impl SubmitCancellationDto {
    pub fn is_final(&self) -> bool {
        self.accepted == Some(true)
    }
}

// --- Response DTOs ---

/// `GET /cancellations` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownsellOfferDto {
    pub downsell_variant: DownsellVariant,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_price: Option<i32>,

    /// Bバリアントのときだけ入る
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downsell_price: Option<i32>,
}

impl DownsellOfferDto {
    /// 契約の月額から提示内容を組み立てる
    pub fn new(variant: DownsellVariant, monthly_price: Option<i32>) -> Self {
        Self {
            downsell_variant: variant,
            monthly_price,
            downsell_price: monthly_price.and_then(|price| variant.downsell_price(price)),
        }
    }
}

/// `POST /cancellations` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCancellationResponseDto {
    pub downsell_variant: DownsellVariant,
}
