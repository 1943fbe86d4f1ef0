mod common;

use common::{booking_date, TestApp};
use serde_json::{json, Value};
use turf_service::models::PaymentPlan;
use turf_service::services::Role;

fn new_turf(plan: &str) -> Value {
    let day = json!({ "open": "06:00", "close": "22:00" });
    json!({
        "name": "Kick Off Arena",
        "address": { "line": "4 FC Road", "city": "Pune" },
        "sports": ["football"],
        "weekdayRate": 80_000,
        "weekendRate": 120_000,
        "operatingHours": {
            "monday": day, "tuesday": day, "wednesday": day, "thursday": day,
            "friday": day, "saturday": day, "sunday": day,
        },
        "slotDuration": 60,
        "paymentPlan": plan,
        "ownerQrUrl": "https://cdn.example/qr.png",
    })
}

async fn create(app: &TestApp, body: &Value) -> reqwest::Response {
    app.post("/turfs")
        .bearer_auth(app.owner_token())
        .json(body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn new_turfs_are_hidden_until_approved() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = create(&app, &new_turf("commission")).await;

    // Assert
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");

    let public = app.get(&format!("/turfs/{}", id)).send().await.unwrap();
    assert_eq!(public.status(), 404);
    let owner = app
        .get(&format!("/turfs/{}", id))
        .bearer_auth(app.owner_token())
        .send()
        .await
        .unwrap();
    assert_eq!(owner.status(), 200);

    let approve = app
        .put(&format!("/admin/turfs/{}/status", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(approve.status(), 200);

    let public = app.get(&format!("/turfs/{}", id)).send().await.unwrap();
    assert_eq!(public.status(), 200);
    let list: Value = app
        .get("/turfs?city=pune")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 1);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn invalid_turfs_are_rejected() {
    let app = TestApp::spawn().await;

    let mut bad_duration = new_turf("commission");
    bad_duration["slotDuration"] = json!(45);
    let mut bad_rate = new_turf("commission");
    bad_rate["weekdayRate"] = json!(0);

    assert_eq!(create(&app, &bad_duration).await.status(), 422);
    assert_eq!(create(&app, &bad_rate).await.status(), 422);

    let as_user = app
        .post("/turfs")
        .bearer_auth(app.user_token())
        .json(&new_turf("commission"))
        .send()
        .await
        .unwrap();
    assert_eq!(as_user.status(), 403);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn tier_turfs_need_an_active_subscription() {
    let app = TestApp::spawn().await;

    assert_eq!(create(&app, &new_turf("tier")).await.status(), 403);

    let subscription: Value = app
        .post("/subscriptions")
        .bearer_auth(app.owner_token())
        .json(&json!({
            "plan": "basic",
            "screenshotUrl": "https://cdn.example/sub.png",
            "paymentReference": "UTR-SUB-1",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sub_id = subscription["data"]["id"].as_str().unwrap();
    app.post(&format!("/admin/subscriptions/{}/verify", sub_id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .expect("subscription approval failed");

    assert_eq!(create(&app, &new_turf("tier")).await.status(), 201);
    // Basic allows a single tier turf
    assert_eq!(create(&app, &new_turf("tier")).await.status(), 403);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn only_the_owner_updates_a_turf() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;

    let stranger = app
        .put(&format!("/turfs/{}", turf.id))
        .bearer_auth(app.token("owner-2", Role::Owner))
        .json(&json!({ "weekdayRate": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), 403);

    let owner = app
        .put(&format!("/turfs/{}", turf.id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "weekdayRate": 90_000, "name": "Green Field Prime" }))
        .send()
        .await
        .unwrap();
    assert_eq!(owner.status(), 200);
    let body: Value = owner.json().await.unwrap();
    assert_eq!(body["data"]["weekdayRate"], 90_000);
    assert_eq!(body["data"]["name"], "Green Field Prime");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn turf_with_upcoming_bookings_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    app.book_ok(&turf, &["10:00"], "cash_at_turf").await;

    let blocked = app
        .delete(&format!("/turfs/{}", turf.id))
        .bearer_auth(app.owner_token())
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status(), 409);

    let empty = app.seed_turf(PaymentPlan::Commission).await;
    let deleted = app
        .delete(&format!("/turfs/{}", empty.id))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn suspended_turfs_cannot_be_booked() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;

    app.put(&format!("/admin/turfs/{}/status", turf.id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "status": "suspended", "note": "complaints" }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .expect("status update failed");

    let booking = app
        .book(&app.user_token(), &turf, &["10:00"], "cash_at_turf")
        .await;
    assert_eq!(booking.status(), 404);

    let slots = app
        .get(&format!(
            "/turfs/{}/available-slots?date={}",
            turf.id,
            booking_date()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(slots.status(), 404);

    app.cleanup().await;
}
