use sea_orm_migration::prelude::*;

use super::m20250801_000001_create_subscriptions_table::Subscriptions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 解約レコードテーブル
        // user_id はユニーク: ユーザーごとに正規のレコードは1件のみ
        manager
            .create_table(
                Table::create()
                    .table(Cancellations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cancellations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Cancellations::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Cancellations::SubscriptionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cancellations::DownsellVariant)
                            .string_len(1)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cancellations::Reason).text().null())
                    .col(
                        ColumnDef::new(Cancellations::AcceptedDownsell)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Cancellations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cancellations_subscription_id")
                            .from(Cancellations::Table, Cancellations::SubscriptionId)
                            .to(Subscriptions::Table, Subscriptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Cancellations::Table)
                    .name("idx_cancellations_subscription_id")
                    .col(Cancellations::SubscriptionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cancellations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Cancellations {
    Table,
    Id,
    UserId,
    SubscriptionId,
    DownsellVariant,
    Reason,
    AcceptedDownsell,
    CreatedAt,
}
