// src/repository/cancellation_repository.rs

use crate::domain::cancellation_model::{
    self, ActiveModel as CancellationActiveModel, DownsellVariant, Entity as CancellationEntity,
};
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbConn, DbErr, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CancellationRepository {
    db: DbConn,
}

impl CancellationRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// ユーザーの正規の解約レコード（user_id はユニーク）
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<cancellation_model::Model>, DbErr> {
        Self::find_by_user_id_with(&self.db, user_id).await
    }

    pub async fn find_by_user_id_with<C>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<cancellation_model::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        CancellationEntity::find()
            .filter(cancellation_model::Column::UserId.eq(user_id))
            .one(conn)
            .await
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<u64, DbErr> {
        CancellationEntity::find()
            .filter(cancellation_model::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
    }

    /// まだレコードが無ければ作成し、正規のレコードを返す
    ///
    /// `INSERT ... ON CONFLICT (user_id) DO NOTHING` の後に読み直すので、
    /// 同一ユーザーの同時リクエストでもバリアントは1つに決まる。
    /// 戻り値の bool はこの呼び出しで挿入したかどうか。
    pub async fn insert_if_absent(
        &self,
        new_cancellation: NewCancellation,
    ) -> Result<(cancellation_model::Model, bool), DbErr> {
        let user_id = new_cancellation.user_id;
        let active_model = new_cancellation.into_active_model();

        let inserted = CancellationEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(cancellation_model::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let record = self.find_by_user_id(user_id).await?.ok_or_else(|| {
            DbErr::RecordNotFound(format!("cancellation for user {} not found", user_id))
        })?;

        Ok((record, inserted > 0))
    }

    /// 最終確定時の理由・ダウンセル受諾フラグを反映する（トランザクション内から呼ぶ）
    ///
    /// レコードが無ければ作成。あれば同じ行を更新し、
    /// 渡された値を優先、None の項目は保存済みの値を残す。
    pub async fn record_final_decision<C>(
        conn: &C,
        decision: NewCancellation,
    ) -> Result<cancellation_model::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        match Self::find_by_user_id_with(conn, decision.user_id).await? {
            None => decision.into_active_model().insert(conn).await,
            Some(existing) => {
                let mut active_model: CancellationActiveModel = existing.into();
                if let Some(reason) = decision.reason {
                    active_model.reason = Set(Some(reason));
                }
                if let Some(accepted_downsell) = decision.accepted_downsell {
                    active_model.accepted_downsell = Set(accepted_downsell);
                }
                if !active_model.is_changed() {
                    return active_model.try_into_model();
                }
                active_model.update(conn).await
            }
        }
    }
}

/// 解約レコード作成用構造体
#[derive(Debug, Clone)]
pub struct NewCancellation {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub variant: DownsellVariant,
    pub reason: Option<String>,
    pub accepted_downsell: Option<bool>,
}

impl NewCancellation {
    fn into_active_model(self) -> CancellationActiveModel {
        CancellationActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            subscription_id: Set(self.subscription_id),
            downsell_variant: Set(self.variant.to_string()),
            reason: Set(self.reason),
            accepted_downsell: Set(self.accepted_downsell.unwrap_or(false)),
            created_at: Set(Utc::now()),
        }
    }
}
