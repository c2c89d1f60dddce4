// tests/unit/service_tests.rs

use cancellation_backend::api::dto::cancellation_dto::SubmitCancellationDto;
use cancellation_backend::domain::cancellation_flow::{
    CancellationFlow, CancellationReason, FlowEvent, JobSearchSurvey,
};
use cancellation_backend::domain::cancellation_model::{
    DownsellVariant, Entity as CancellationEntity,
};
use cancellation_backend::domain::subscription_model::{
    Entity as SubscriptionEntity, SubscriptionStatus,
};
use cancellation_backend::error::AppError;
use cancellation_backend::repository::cancellation_repository::{
    CancellationRepository, NewCancellation,
};
use cancellation_backend::repository::subscription_repository::SubscriptionRepository;
use cancellation_backend::service::cancellation_service::CancellationService;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::common::{db::TestDatabase, test_data};

#[tokio::test]
async fn test_existing_variant_is_returned_with_current_pricing() {
    let db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    let subscription = test_data::create_subscription(&db.connection, user_id, 500, 1).await;
    CancellationRepository::new(db.connection.clone())
        .insert_if_absent(NewCancellation {
            user_id,
            subscription_id: subscription.id,
            variant: DownsellVariant::B,
            reason: None,
            accepted_downsell: None,
        })
        .await
        .unwrap();

    let service = CancellationService::new(db.connection.clone());
    let offer = service.get_or_assign_variant(user_id).await.unwrap();

    assert_eq!(offer.downsell_variant, DownsellVariant::B);
    assert_eq!(offer.monthly_price, Some(500));
    // 割引後が負にならない
    assert_eq!(offer.downsell_price, Some(0));
}

#[tokio::test]
async fn test_variant_a_has_no_discount() {
    let db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    let subscription = test_data::create_subscription(&db.connection, user_id, 2500, 1).await;
    CancellationRepository::new(db.connection.clone())
        .insert_if_absent(NewCancellation {
            user_id,
            subscription_id: subscription.id,
            variant: DownsellVariant::A,
            reason: None,
            accepted_downsell: None,
        })
        .await
        .unwrap();

    let service = CancellationService::new(db.connection.clone());
    let offer = service.get_or_assign_variant(user_id).await.unwrap();

    assert_eq!(offer.downsell_variant, DownsellVariant::A);
    assert_eq!(offer.monthly_price, Some(2500));
    assert_eq!(offer.downsell_price, None);
}

#[tokio::test]
async fn test_missing_subscription_is_reported() {
    let db = TestDatabase::new().await;
    let service = CancellationService::new(db.connection.clone());

    let result = service.get_or_assign_variant(Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(AppError::NoSubscription(ref message)) if message == "no subscription found for user"
    ));

    let result = service
        .submit_cancellation(Uuid::new_v4(), SubmitCancellationDto::default())
        .await;
    assert!(matches!(result, Err(AppError::NoSubscription(_))));
}

#[tokio::test]
async fn test_blank_reason_is_stored_as_null() {
    let db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    test_data::create_subscription(&db.connection, user_id, 2500, 1).await;
    let service = CancellationService::new(db.connection.clone());

    service
        .submit_cancellation(
            user_id,
            SubmitCancellationDto {
                reason: Some("   \u{0007}  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let records = CancellationEntity::find().all(&db.connection).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].reason.is_none());
}

#[tokio::test]
async fn test_completed_wizard_submission_confirms_cancellation() {
    let db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    let subscription = test_data::create_subscription(&db.connection, user_id, 2500, 1).await;
    let service = CancellationService::new(db.connection.clone());

    let offer = service.get_or_assign_variant(user_id).await.unwrap();

    // 割り当てられたバリアントでウィザードを最後まで進める
    let mut flow = CancellationFlow::new(offer.downsell_variant);
    flow.apply(FlowEvent::StillLooking).unwrap();
    if offer.downsell_variant.offers_discount() {
        flow.apply(FlowEvent::DeclineOffer).unwrap();
    }
    flow.apply(FlowEvent::SurveySubmitted(JobSearchSurvey {
        applied: "5-10".to_string(),
        emailed: "1-5".to_string(),
        interviewed: "0".to_string(),
    }))
    .unwrap();
    flow.apply(FlowEvent::ReasonSubmitted(CancellationReason::DecidedNotToMove))
        .unwrap();

    let submission = flow.submission().unwrap();
    let response = service
        .submit_cancellation(user_id, submission)
        .await
        .unwrap();
    assert_eq!(response.downsell_variant, offer.downsell_variant);

    let stored = SubscriptionEntity::find_by_id(subscription.id)
        .one(&db.connection)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.status,
        SubscriptionStatus::PendingCancellation.to_string()
    );

    let records = CancellationEntity::find().all(&db.connection).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reason.as_deref(), Some("decided-not-to-move"));
}

#[tokio::test]
async fn test_deleted_subscription_removes_record_and_rejects_final_submission() {
    let db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    let subscription = test_data::create_subscription(&db.connection, user_id, 2500, 1).await;
    let service = CancellationService::new(db.connection.clone());
    service
        .submit_cancellation(
            user_id,
            SubmitCancellationDto {
                reason: Some("original".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // 契約の削除で解約レコードも消える
    SubscriptionEntity::delete_by_id(subscription.id)
        .exec(&db.connection)
        .await
        .unwrap();
    assert!(CancellationEntity::find()
        .all(&db.connection)
        .await
        .unwrap()
        .is_empty());

    let result = service
        .submit_cancellation(
            user_id,
            SubmitCancellationDto {
                reason: Some("updated".to_string()),
                accepted: Some(true),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NoSubscription(_))));
}

#[tokio::test]
async fn test_transaction_rolls_back_on_error() {
    let db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    let subscription = test_data::create_subscription(&db.connection, user_id, 2500, 1).await;
    let subscription_id = subscription.id;

    let result: Result<(), AppError> =
        cancellation_backend::with_transaction!(db.connection, |txn| async move {
            SubscriptionRepository::mark_pending_cancellation(txn, subscription_id).await?;
            Err::<(), _>(AppError::InternalServerError("abort".to_string()))
        });
    assert!(result.is_err());

    let stored = SubscriptionEntity::find_by_id(subscription_id)
        .one(&db.connection)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Active.to_string());
}
