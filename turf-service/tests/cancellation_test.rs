mod common;

use chrono::{Duration, FixedOffset, Utc};
use common::{TestApp, OTHER_USER_ID, OWNER_ID, RAZORPAY_KEY_SECRET, USER_ID};
use serde_json::{json, Value};
use service_core::utils::signature::hmac_sha256_hex;
use turf_service::models::{
    Booking, NewBooking, PaymentMethod, PaymentPlan, PlayerDetails, PriceBreakdown, TimeSlot,
};
use turf_service::services::Role;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn cancel_body() -> Value {
    json!({ "reason": "Plans changed", "qrImageUrl": "https://cdn.example/my-upi.png" })
}

async fn cancel(app: &TestApp, id: &str) -> reqwest::Response {
    app.put(&format!("/bookings/{}/cancel", id))
        .bearer_auth(app.user_token())
        .json(&cancel_body())
        .send()
        .await
        .expect("Failed to execute request")
}

async fn decide(app: &TestApp, id: &str, approve: bool) -> reqwest::Response {
    app.put(&format!("/bookings/{}/refund", id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "approve": approve, "note": "ok" }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn cancellation_requests_refund_less_fee() {
    // Arrange
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["18:00"], "cash_at_turf").await;
    let id = body["booking"]["id"].as_str().unwrap();

    // Act
    let response = cancel(&app, id).await;

    // Assert
    assert_eq!(response.status(), 200);
    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "pending_refund");
    assert_eq!(booking["refundRequest"]["amount"], 90_000);
    assert_eq!(booking["refundRequest"]["reason"], "Plans changed");
    assert_eq!(booking["cancellation"]["cancelledBy"], "user");

    // The slot is released as soon as the user cancels
    app.book(
        &app.token(OTHER_USER_ID, Role::User),
        &turf,
        &["18:00"],
        "cash_at_turf",
    )
    .await
    .error_for_status()
    .expect("slot should be free again");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn tier_bookings_refund_in_full() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Tier).await;
    let body = app.book_ok(&turf, &["18:00"], "cash_at_turf").await;
    let id = body["booking"]["id"].as_str().unwrap();

    assert_eq!(cancel(&app, id).await.status(), 200);

    let booking = app.booking(id).await;
    assert_eq!(booking["refundRequest"]["amount"], 100_000);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn slots_starting_within_two_hours_cannot_be_cancelled() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;

    // One hour from now at the venue (UTC+05:30)
    let venue = FixedOffset::east_opt(330 * 60).unwrap();
    let start = (Utc::now() + Duration::hours(1)).with_timezone(&venue);
    let end = start + Duration::hours(1);
    let booking = Booking::new(NewBooking {
        turf_id: turf.id.clone(),
        owner_id: OWNER_ID.to_string(),
        user_id: USER_ID.to_string(),
        date: start.date_naive(),
        time_slots: vec![TimeSlot {
            start_time: start.format("%H:%M").to_string(),
            end_time: end.format("%H:%M").to_string(),
        }],
        sport: "football".to_string(),
        player_details: PlayerDetails {
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            email: None,
            player_count: None,
        },
        notes: None,
        pricing: PriceBreakdown {
            slot_rate: 100_000,
            slot_count: 1,
            base_price: 100_000,
            platform_fee: 10_000,
            owner_earnings: 90_000,
            total_amount: 100_000,
            plan: PaymentPlan::Commission,
            commission_bps: 1_000,
        },
        method: PaymentMethod::CashAtTurf,
    });
    app.db.bookings().insert(&booking).await.unwrap();

    let response = cancel(&app, &booking.id).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("2 hours"));
    let stored = app.booking(&booking.id).await;
    assert_eq!(stored["status"], "confirmed");
    assert!(stored["refundRequest"].is_null());

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn only_the_customer_can_cancel() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["18:00"], "cash_at_turf").await;
    let id = body["booking"]["id"].as_str().unwrap();

    let response = app
        .put(&format!("/bookings/{}/cancel", id))
        .bearer_auth(app.token(OTHER_USER_ID, Role::User))
        .json(&cancel_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let missing = app
        .put(&format!("/bookings/{}/cancel", id))
        .bearer_auth(app.user_token())
        .json(&json!({ "reason": "", "qrImageUrl": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn owner_approval_without_gateway_payment_completes_refund() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["18:00"], "cash_at_turf").await;
    let id = body["booking"]["id"].as_str().unwrap();
    cancel(&app, id).await;

    let response = decide(&app, id, true).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["booking"]["status"], "refund_completed");
    assert_eq!(body["gatewayRefund"]["status"], "not_applicable");
    assert_eq!(body["booking"]["refundRequest"]["decidedBy"], common::OWNER_ID);

    // Decisions are final
    assert_eq!(decide(&app, id, false).await.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn owner_can_deny_refund() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["18:00"], "cash_at_turf").await;
    let id = body["booking"]["id"].as_str().unwrap();
    cancel(&app, id).await;

    let response = decide(&app, id, false).await;

    assert_eq!(response.status(), 200);
    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "refund_denied");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn approving_online_refund_reverses_gateway_payment() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_R1",
            "amount": 100_000,
            "currency": "INR",
            "receipt": "r",
            "status": "created",
        })))
        .mount(&app.razorpay)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/pay_R1/refund"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "rfnd_R1",
            "payment_id": "pay_R1",
            "amount": 90_000,
            "status": "processed",
        })))
        .expect(1)
        .mount(&app.razorpay)
        .await;

    let body = app.book_ok(&turf, &["18:00"], "online").await;
    let id = body["booking"]["id"].as_str().unwrap();
    let signature = hmac_sha256_hex(RAZORPAY_KEY_SECRET, "order_R1|pay_R1").unwrap();
    let verified = app
        .post(&format!("/bookings/{}/verify-payment", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "razorpayOrderId": "order_R1",
            "razorpayPaymentId": "pay_R1",
            "razorpaySignature": signature,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(verified.status(), 200);
    cancel(&app, id).await;

    let response = decide(&app, id, true).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["gatewayRefund"]["status"], "processed");
    assert_eq!(body["gatewayRefund"]["refundId"], "rfnd_R1");
    assert_eq!(body["booking"]["status"], "refund_completed");
    assert_eq!(body["booking"]["payment"]["status"], "refunded");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn failed_gateway_refund_is_reported() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_F1",
            "amount": 100_000,
            "currency": "INR",
            "receipt": "r",
            "status": "created",
        })))
        .mount(&app.razorpay)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/pay_F1/refund"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "BAD_REQUEST_ERROR", "description": "already refunded" }
        })))
        .mount(&app.razorpay)
        .await;

    let body = app.book_ok(&turf, &["18:00"], "online").await;
    let id = body["booking"]["id"].as_str().unwrap();
    let signature = hmac_sha256_hex(RAZORPAY_KEY_SECRET, "order_F1|pay_F1").unwrap();
    app.post(&format!("/bookings/{}/verify-payment", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "razorpayOrderId": "order_F1",
            "razorpayPaymentId": "pay_F1",
            "razorpaySignature": signature,
        }))
        .send()
        .await
        .unwrap();
    cancel(&app, id).await;

    let response = decide(&app, id, true).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["gatewayRefund"]["status"], "failed");
    assert_eq!(body["booking"]["status"], "refund_completed");
    assert_eq!(body["booking"]["payment"]["status"], "completed");

    app.cleanup().await;
}
