// tests/integration/cancellation/submit_cancellation_tests.rs

use axum::http::StatusCode;
use cancellation_backend::domain::cancellation_model::{
    Column as CancellationColumn, Entity as CancellationEntity,
};
use cancellation_backend::domain::subscription_model::{
    Entity as SubscriptionEntity, SubscriptionStatus,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{app_helper, request, test_data};

async fn stored_record(
    app: &app_helper::TestApp,
    user_id: Uuid,
) -> cancellation_backend::domain::cancellation_model::Model {
    CancellationEntity::find()
        .filter(CancellationColumn::UserId.eq(user_id))
        .one(&app.db.connection)
        .await
        .unwrap()
        .unwrap()
}

async fn subscription_status(app: &app_helper::TestApp, id: Uuid) -> String {
    SubscriptionEntity::find_by_id(id)
        .one(&app.db.connection)
        .await
        .unwrap()
        .unwrap()
        .status
}

#[tokio::test]
async fn test_submit_records_attempt_without_confirming() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    let subscription = test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;

    let response = app
        .router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({ "reason": "too expensive", "accepted_downsell": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = request::body_json(response).await;
    assert!(matches!(body["downsell_variant"].as_str(), Some("A") | Some("B")));

    let record = stored_record(&app, user_id).await;
    assert_eq!(record.reason.as_deref(), Some("too expensive"));
    assert_eq!(record.subscription_id, subscription.id);
    assert_eq!(
        subscription_status(&app, subscription.id).await,
        SubscriptionStatus::Active.to_string()
    );
}

#[tokio::test]
async fn test_submit_reuses_variant_assigned_by_get() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;

    let get_response = app
        .router
        .clone()
        .oneshot(request::get_request("/cancellations"))
        .await
        .unwrap();
    let assigned = request::body_json(get_response).await["downsell_variant"].clone();

    let post_response = app
        .router
        .clone()
        .oneshot(request::json_request("POST", "/cancellations", &json!({})))
        .await
        .unwrap();
    assert_eq!(post_response.status(), StatusCode::OK);
    let body = request::body_json(post_response).await;
    assert_eq!(body["downsell_variant"], assigned);
}

#[tokio::test]
async fn test_final_acceptance_marks_pending_and_updates_record_in_place() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    let subscription = test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;

    // 先にバリアントを割り当てておく
    app.router
        .clone()
        .oneshot(request::get_request("/cancellations"))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({
                "subscription_id": subscription.id.to_string(),
                "reason": "found a job",
                "accepted_downsell": false,
                "accepted": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        subscription_status(&app, subscription.id).await,
        SubscriptionStatus::PendingCancellation.to_string()
    );
    let updated = SubscriptionEntity::find_by_id(subscription.id)
        .one(&app.db.connection)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.updated_at >= subscription.updated_at);

    let rows = CancellationEntity::find()
        .filter(CancellationColumn::UserId.eq(user_id))
        .count(&app.db.connection)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let record = stored_record(&app, user_id).await;
    assert_eq!(record.reason.as_deref(), Some("found a job"));
    assert!(!record.accepted_downsell);
}

#[tokio::test]
async fn test_final_acceptance_keeps_previous_values_when_omitted() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    let subscription = test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;

    app.router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({ "reason": "not enough jobs", "accepted_downsell": true }),
        ))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({ "accepted": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = stored_record(&app, user_id).await;
    assert_eq!(record.reason.as_deref(), Some("not enough jobs"));
    assert!(record.accepted_downsell);
    assert_eq!(
        subscription_status(&app, subscription.id).await,
        SubscriptionStatus::PendingCancellation.to_string()
    );

    // 二度目の確定でもステータスは変わらない
    let again = app
        .router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({ "accepted": true }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(
        subscription_status(&app, subscription.id).await,
        SubscriptionStatus::PendingCancellation.to_string()
    );
}

#[tokio::test]
async fn test_malformed_or_foreign_subscription_id_falls_back_to_latest() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    let own = test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;
    let foreign =
        test_data::create_subscription(&app.db.connection, Uuid::new_v4(), 9900, 1).await;

    for candidate in [
        "not-a-uuid".to_string(),
        own.id.simple().to_string(),
        Uuid::new_v4().to_string(),
        foreign.id.to_string(),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(request::json_request(
                "POST",
                "/cancellations",
                &json!({ "subscription_id": candidate, "accepted": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "candidate {}", candidate);
    }

    assert_eq!(
        subscription_status(&app, own.id).await,
        SubscriptionStatus::PendingCancellation.to_string()
    );
    assert_eq!(
        subscription_status(&app, foreign.id).await,
        SubscriptionStatus::Active.to_string()
    );
    assert_eq!(stored_record(&app, user_id).await.subscription_id, own.id);
}

#[tokio::test]
async fn test_reason_is_sanitized_before_storing() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;

    let raw_reason = format!("{}\u{0007}bad", "  A".repeat(200));
    let response = app
        .router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({ "reason": raw_reason }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reason = stored_record(&app, user_id).await.reason.unwrap();
    assert!(reason.chars().count() <= 500);
    assert!(!reason.starts_with(' '));
    assert!(!reason.chars().any(|c| c.is_ascii_control()));
}

#[tokio::test]
async fn test_submit_without_subscription_is_bad_request() {
    let app = app_helper::setup_app().await;

    let response = app
        .router
        .clone()
        .oneshot(request::json_request(
            "POST",
            "/cancellations",
            &json!({ "subscription_id": Uuid::new_v4().to_string(), "accepted": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = request::body_json(response).await;
    assert_eq!(
        body["error"],
        "no subscription found for user; please provide subscription_id"
    );

    let rows = CancellationEntity::find()
        .count(&app.db.connection)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let app = app_helper::setup_app().await;
    let user_id = test_data::mock_user_id();
    test_data::create_subscription(&app.db.connection, user_id, 2500, 1).await;

    for body in ["{\"accepted\": tru", "", "[1,2,3]"] {
        let response = app
            .router
            .clone()
            .oneshot(request::raw_request("POST", "/cancellations", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {:?}", body);
        let json = request::body_json(response).await;
        assert_eq!(json["error"], "invalid json");
    }

    let rows = CancellationEntity::find()
        .count(&app.db.connection)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}
