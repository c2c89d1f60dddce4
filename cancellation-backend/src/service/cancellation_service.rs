// src/service/cancellation_service.rs

use crate::api::dto::cancellation_dto::{
    DownsellOfferDto, SubmitCancellationDto, SubmitCancellationResponseDto,
};
use crate::db::DbPool;
use crate::domain::cancellation_model::DownsellVariant;
use crate::error::{AppError, AppResult};
use crate::repository::cancellation_repository::{CancellationRepository, NewCancellation};
use crate::repository::subscription_repository::SubscriptionRepository;
use crate::utils::validation::{parse_subscription_id, sanitize_reason};
use crate::with_transaction;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const NO_SUBSCRIPTION_MESSAGE: &str = "no subscription found for user";
pub const NO_SUBSCRIPTION_SUBMIT_MESSAGE: &str =
    "no subscription found for user; please provide subscription_id";

pub struct CancellationService {
    db: DbPool,
    subscription_repo: Arc<SubscriptionRepository>,
    cancellation_repo: Arc<CancellationRepository>,
}

impl CancellationService {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            subscription_repo: Arc::new(SubscriptionRepository::new(db_pool.clone())),
            cancellation_repo: Arc::new(CancellationRepository::new(db_pool.clone())),
            db: db_pool,
        }
    }

    /// ユーザーのバリアントを返す。初回だけ抽選して保存する
    pub async fn get_or_assign_variant(&self, user_id: Uuid) -> AppResult<DownsellOfferDto> {
        if let Some(existing) = self.cancellation_repo.find_by_user_id(user_id).await? {
            let variant = existing.variant()?;
            // 契約が消えていても割り当て済みのバリアントは返す
            let monthly_price = self
                .subscription_repo
                .find_by_id(existing.subscription_id)
                .await?
                .map(|subscription| subscription.monthly_price);
            return Ok(DownsellOfferDto::new(variant, monthly_price));
        }

        let subscription = self
            .subscription_repo
            .find_latest_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::NoSubscription(NO_SUBSCRIPTION_MESSAGE.to_string()))?;

        let (record, inserted) = self
            .cancellation_repo
            .insert_if_absent(NewCancellation {
                user_id,
                subscription_id: subscription.id,
                variant: DownsellVariant::draw(),
                reason: None,
                accepted_downsell: None,
            })
            .await?;

        let variant = record.variant()?;
        if inserted {
            info!(
                user_id = %user_id,
                subscription_id = %subscription.id,
                variant = %variant,
                "Downsell variant assigned"
            );
        }

        // 競合で他のリクエストが先に作った場合はその契約の価格を使う
        let monthly_price = if record.subscription_id == subscription.id {
            Some(subscription.monthly_price)
        } else {
            self.subscription_repo
                .find_by_id(record.subscription_id)
                .await?
                .map(|subscription| subscription.monthly_price)
        };

        Ok(DownsellOfferDto::new(variant, monthly_price))
    }

    /// 解約の試行を記録し、`accepted` が true なら解約を確定する
    pub async fn submit_cancellation(
        &self,
        user_id: Uuid,
        payload: SubmitCancellationDto,
    ) -> AppResult<SubmitCancellationResponseDto> {
        let subscription_id = self
            .resolve_subscription_id(user_id, payload.subscription_id.as_deref())
            .await?;
        let reason = sanitize_reason(payload.reason.as_deref());

        let variant = match self.cancellation_repo.find_by_user_id(user_id).await? {
            Some(existing) => existing.variant()?,
            None => {
                let (record, inserted) = self
                    .cancellation_repo
                    .insert_if_absent(NewCancellation {
                        user_id,
                        subscription_id,
                        variant: DownsellVariant::draw(),
                        reason: reason.clone(),
                        accepted_downsell: payload.accepted_downsell,
                    })
                    .await?;
                if inserted {
                    info!(
                        user_id = %user_id,
                        subscription_id = %subscription_id,
                        variant = %record.downsell_variant,
                        "Cancellation attempt recorded"
                    );
                }
                record.variant()?
            }
        };

        if payload.is_final() {
            let decision = NewCancellation {
                user_id,
                subscription_id,
                variant,
                reason,
                accepted_downsell: payload.accepted_downsell,
            };

            with_transaction!(self.db, |txn| async move {
                SubscriptionRepository::mark_pending_cancellation(txn, subscription_id).await?;
                CancellationRepository::record_final_decision(txn, decision).await?;
                Ok::<_, AppError>(())
            })?;

            info!(
                user_id = %user_id,
                subscription_id = %subscription_id,
                variant = %variant,
                "Cancellation confirmed"
            );
        }

        Ok(SubmitCancellationResponseDto {
            downsell_variant: variant,
        })
    }

    /// 指定IDが本人の契約なら採用し、そうでなければ最新の契約にフォールバックする
    async fn resolve_subscription_id(
        &self,
        user_id: Uuid,
        requested: Option<&str>,
    ) -> AppResult<Uuid> {
        if let Some(candidate) = parse_subscription_id(requested) {
            if let Some(owned) = self
                .subscription_repo
                .find_owned_by_user(candidate, user_id)
                .await?
            {
                return Ok(owned.id);
            }
            warn!(
                user_id = %user_id,
                subscription_id = %candidate,
                "Ignoring subscription_id not owned by user"
            );
        } else if requested.is_some() {
            warn!(user_id = %user_id, "Ignoring malformed subscription_id");
        }

        self.subscription_repo
            .find_latest_for_user(user_id)
            .await?
            .map(|subscription| subscription.id)
            .ok_or_else(|| AppError::NoSubscription(NO_SUBSCRIPTION_SUBMIT_MESSAGE.to_string()))
    }

    /// ユーザーの解約レコード数。user_id がユニークなので 0 か 1
    pub async fn cancellation_count(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.cancellation_repo.count_for_user(user_id).await?)
    }
}
