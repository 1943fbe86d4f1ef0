mod common;

use common::{TestApp, OWNER_ID};
use serde_json::{json, Value};

async fn request_plan(app: &TestApp, plan: &str) -> reqwest::Response {
    app.post("/subscriptions")
        .bearer_auth(app.owner_token())
        .json(&json!({
            "plan": plan,
            "screenshotUrl": "https://cdn.example/sub.png",
            "paymentReference": "UTR-SUB-1",
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn plans_are_public() {
    let app = TestApp::spawn().await;

    let response = app.get("/subscriptions/plans").send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let plans = body["data"].as_array().unwrap();
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0]["plan"], "basic");
    assert_eq!(plans[0]["maxTurfs"], 1);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn owner_has_at_most_one_open_subscription() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let first = request_plan(&app, "pro").await;
    let second = request_plan(&app, "basic").await;

    // Assert
    assert_eq!(first.status(), 201);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["ownerId"], OWNER_ID);
    assert_eq!(body["data"]["maxTurfs"], 3);
    assert_eq!(second.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn approval_activates_for_plan_duration() {
    let app = TestApp::spawn().await;
    let body: Value = request_plan(&app, "basic").await.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap();

    let response = app
        .post(&format!("/admin/subscriptions/{}/verify", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "active");
    assert!(body["data"]["startDate"].is_string());
    assert!(body["data"]["endDate"].is_string());

    // Already reviewed
    let again = app
        .post(&format!("/admin/subscriptions/{}/verify", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": false, "rejectionReason": "late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn rejected_subscription_records_reason() {
    let app = TestApp::spawn().await;
    let body: Value = request_plan(&app, "basic").await.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap();

    let response = app
        .post(&format!("/admin/subscriptions/{}/verify", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": false, "rejectionReason": "Reference not found" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejectionReason"], "Reference not found");

    // A rejected request no longer blocks a new one
    assert_eq!(request_plan(&app, "pro").await.status(), 201);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn owner_cancels_own_subscription() {
    let app = TestApp::spawn().await;
    let body: Value = request_plan(&app, "basic").await.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap();

    let stranger = app
        .put(&format!("/subscriptions/{}/cancel", id))
        .bearer_auth(app.token("owner-2", turf_service::services::Role::Owner))
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), 403);

    let cancelled = app
        .put(&format!("/subscriptions/{}/cancel", id))
        .bearer_auth(app.owner_token())
        .send()
        .await
        .unwrap();
    assert_eq!(cancelled.status(), 200);

    let twice = app
        .put(&format!("/subscriptions/{}/cancel", id))
        .bearer_auth(app.owner_token())
        .send()
        .await
        .unwrap();
    assert_eq!(twice.status(), 400);

    let mine: Value = app
        .get("/subscriptions/my")
        .bearer_auth(app.owner_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine["data"][0]["status"], "cancelled");

    app.cleanup().await;
}
