// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// サブスクリプション・解約関連マイグレーション
mod m20250801_000001_create_subscriptions_table;
mod m20250801_000002_create_cancellations_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. subscriptions（依存関係なし）
            Box::new(m20250801_000001_create_subscriptions_table::Migration),
            // 2. cancellations（subscriptions に依存）
            Box::new(m20250801_000002_create_cancellations_table::Migration),
        ]
    }
}
