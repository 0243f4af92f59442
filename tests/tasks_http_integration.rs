//! Integration tests for enhancement task HTTP endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use sharpii::adapters::auth::MockSessionValidator;
use sharpii::adapters::dodo::MockPaymentProvider;
use sharpii::adapters::enhancement::MockEnhancementProvider;
use sharpii::adapters::http::{app_router, AppState, AuthState, RouterOptions};
use sharpii::adapters::memory::{
    InMemoryCheckoutSessionRepository, InMemoryCreditPurchaseRepository,
    InMemoryCreditRepository, InMemoryPaymentRepository, InMemorySubscriptionRepository,
    InMemoryTaskRepository, InMemoryWebhookEventRepository,
};
use sharpii::application::handlers::payments::ProductCatalog;
use sharpii::application::handlers::tasks::EnhancementProviders;
use sharpii::domain::billing::{CreditReason, CreditTransaction};
use sharpii::domain::enhancement::{ProviderKind, ProviderUpdate};
use sharpii::domain::foundation::UserId;
use sharpii::ports::{CreditRepository, EnhancementProvider};

// =============================================================================
// Test Infrastructure
// =============================================================================

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

struct TestApp {
    router: Router,
    credits: Arc<InMemoryCreditRepository>,
    replicate: Arc<MockEnhancementProvider>,
}

fn test_app_with(replicate: MockEnhancementProvider) -> TestApp {
    let credits = Arc::new(InMemoryCreditRepository::new());
    let replicate = Arc::new(replicate);
    let providers: Vec<Arc<dyn EnhancementProvider>> = vec![
        replicate.clone(),
        Arc::new(MockEnhancementProvider::new(ProviderKind::RunningHub)),
    ];

    let state = AppState {
        payment_provider: Arc::new(MockPaymentProvider::new()),
        credits: credits.clone(),
        subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
        payments: Arc::new(InMemoryPaymentRepository::new()),
        checkout_sessions: Arc::new(InMemoryCheckoutSessionRepository::new()),
        purchases: Arc::new(InMemoryCreditPurchaseRepository::new()),
        webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
        tasks: Arc::new(InMemoryTaskRepository::new()),
        providers: EnhancementProviders::new(providers),
        catalog: ProductCatalog::default(),
        checkout_timeout: Duration::from_secs(2),
        app_url: None,
    };

    let validator = MockSessionValidator::new()
        .with_test_user(ALICE, "alice")
        .with_test_user(BOB, "bob");
    let auth = AuthState::new(Arc::new(validator), vec![]);

    TestApp {
        router: app_router(state, auth, &RouterOptions::default()),
        credits,
        replicate,
    }
}

fn test_app() -> TestApp {
    test_app_with(MockEnhancementProvider::new(ProviderKind::Replicate))
}

async fn grant(app: &TestApp, user_id: &str, amount: i64) {
    let entry = CreditTransaction::credit(
        UserId::new(user_id).unwrap(),
        amount,
        CreditReason::Adjustment,
        "test grant",
        None,
    )
    .unwrap();
    app.credits.record(&entry).await.unwrap();
}

fn submit(token: &str, model: &str) -> Request<Body> {
    Request::post("/api/tasks")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "model": model, "imageUrl": "https://img.sharpii.ai/in.png" }).to_string(),
        ))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn balance(app: &TestApp, token: &str) -> i64 {
    let (_, body) = send(app, get("/api/credits/balance", token)).await;
    body["total"].as_i64().unwrap()
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn submission_charges_the_model_cost() {
    let app = test_app();
    grant(&app, "alice", 20).await;

    let (status, body) = send(&app, submit(ALICE, "real-esrgan")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["status"], "pending");
    assert_eq!(body["task"]["creditsConsumed"], 5);
    assert_eq!(body["task"]["provider"], "replicate");
    assert!(body["task"].get("providerTaskId").is_none());
    assert_eq!(balance(&app, ALICE).await, 15);
    assert_eq!(app.replicate.submissions().len(), 1);
}

#[tokio::test]
async fn submission_without_enough_credits_is_rejected() {
    let app = test_app();
    grant(&app, "alice", 3).await;

    let (status, body) = send(&app, submit(ALICE, "real-esrgan")).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["details"]["required"], 5);
    assert_eq!(body["details"]["available"], 3);
    assert_eq!(balance(&app, ALICE).await, 3);
    assert!(app.replicate.submissions().is_empty());
}

#[tokio::test]
async fn unknown_model_is_bad_request() {
    let app = test_app();
    grant(&app, "alice", 20).await;

    let (status, _) = send(&app, submit(ALICE, "dall-e")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(balance(&app, ALICE).await, 20);
}

#[tokio::test]
async fn provider_rejection_refunds_the_charge() {
    let app = test_app_with(
        MockEnhancementProvider::new(ProviderKind::Replicate).with_submit_error("model offline"),
    );
    grant(&app, "alice", 20).await;

    let (status, _) = send(&app, submit(ALICE, "real-esrgan")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(balance(&app, ALICE).await, 20);

    let (_, list) = send(&app, get("/api/tasks/list?status=failed", ALICE)).await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn submission_requires_authentication() {
    let app = test_app();
    let request = Request::post("/api/tasks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "model": "real-esrgan", "imageUrl": "https://img.sharpii.ai/in.png" })
                .to_string(),
        ))
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Status and listing
// =============================================================================

#[tokio::test]
async fn status_poll_applies_provider_completion() {
    let app = test_app();
    grant(&app, "alice", 20).await;
    let (_, created) = send(&app, submit(ALICE, "real-esrgan")).await;
    let task_id = created["task"]["id"].as_str().unwrap().to_string();
    app.replicate
        .push_update("job-1", ProviderUpdate::completed("https://img.sharpii.ai/out.png"));

    let (status, body) = send(&app, get(&format!("/api/tasks/{}", task_id), ALICE)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "completed");
    assert_eq!(body["task"]["progress"], 100);
    assert_eq!(body["task"]["enhancedUrl"], "https://img.sharpii.ai/out.png");
}

#[tokio::test]
async fn another_users_task_is_not_found() {
    let app = test_app();
    grant(&app, "alice", 20).await;
    let (_, created) = send(&app, submit(ALICE, "real-esrgan")).await;
    let task_id = created["task"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, get(&format!("/api/tasks/{}", task_id), BOB)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let app = test_app();

    let (status, _) = send(
        &app,
        get("/api/tasks/6f1c2d9e-8a55-4b7e-9d1e-1b2f3c4d5e6f", ALICE),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_pages_with_has_more() {
    let app = test_app();
    grant(&app, "alice", 100).await;
    for _ in 0..3 {
        let (status, _) = send(&app, submit(ALICE, "real-esrgan")).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = send(&app, get("/api/tasks/list?limit=2", ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(first["total"], 3);
    assert_eq!(first["hasMore"], true);

    let (_, second) = send(&app, get("/api/tasks/list?limit=2&offset=2", ALICE)).await;
    assert_eq!(second["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(second["hasMore"], false);

    let (_, all) = send(&app, get("/api/tasks/list?status=all", ALICE)).await;
    assert_eq!(all["total"], 3);
}

#[tokio::test]
async fn list_only_shows_own_tasks() {
    let app = test_app();
    grant(&app, "alice", 20).await;
    send(&app, submit(ALICE, "real-esrgan")).await;

    let (status, body) = send(&app, get("/api/tasks/list", BOB)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"], json!([]));
    assert_eq!(body["hasMore"], false);
}

#[tokio::test]
async fn list_with_unknown_status_is_bad_request() {
    let app = test_app();

    let (status, _) = send(&app, get("/api/tasks/list?status=cancelled", ALICE)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
