mod common;

use common::{TestApp, RAZORPAY_KEY_SECRET};
use serde_json::{json, Value};
use service_core::utils::signature::hmac_sha256_hex;
use turf_service::models::{PaymentPlan, Transaction};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const ORDER_ID: &str = "order_TEST123";
const PAYMENT_ID: &str = "pay_TEST456";

async fn mock_order(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": ORDER_ID,
            "amount": 100_000,
            "currency": "INR",
            "receipt": "receipt",
            "status": "created",
        })))
        .mount(&app.razorpay)
        .await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn valid_signature_confirms_online_booking() {
    // Arrange
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    mock_order(&app).await;
    let body = app.book_ok(&turf, &["18:00"], "online").await;
    let id = body["booking"]["id"].as_str().unwrap();
    assert_eq!(body["razorpayOrder"]["orderId"], ORDER_ID);
    assert_eq!(body["booking"]["status"], "pending");

    let signature =
        hmac_sha256_hex(RAZORPAY_KEY_SECRET, &format!("{}|{}", ORDER_ID, PAYMENT_ID)).unwrap();

    // Act
    let response = app
        .post(&format!("/bookings/{}/verify-payment", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "razorpayOrderId": ORDER_ID,
            "razorpayPaymentId": PAYMENT_ID,
            "razorpaySignature": signature,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status(), 200);
    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["payment"]["status"], "completed");
    assert_eq!(booking["payment"]["razorpayPaymentId"], PAYMENT_ID);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn wrong_signature_cancels_booking_and_frees_slot() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    mock_order(&app).await;
    let body = app.book_ok(&turf, &["19:00"], "online").await;
    let id = body["booking"]["id"].as_str().unwrap();

    let response = app
        .post(&format!("/bookings/{}/verify-payment", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "razorpayOrderId": ORDER_ID,
            "razorpayPaymentId": PAYMENT_ID,
            "razorpaySignature": "0".repeat(64),
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "cancelled");
    assert_eq!(booking["payment"]["status"], "failed");
    assert_eq!(booking["cancellation"]["cancelledBy"], "system");

    // The slot is free again
    app.book_ok(&turf, &["19:00"], "cash_at_turf").await;

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn gateway_failure_rolls_back_slot_locks() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": "SERVER_ERROR", "description": "down" }
        })))
        .mount(&app.razorpay)
        .await;

    let response = app
        .book(&app.user_token(), &turf, &["21:00"], "online")
        .await;
    assert_eq!(response.status(), 502);

    app.book_ok(&turf, &["21:00"], "cash_at_turf").await;

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn owner_rejects_tier_screenshot_with_reason() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Tier).await;
    let body = app.book_ok(&turf, &["17:00"], "online").await;
    let id = body["booking"]["id"].as_str().unwrap();

    let upload = app
        .post(&format!("/bookings/{}/tier-payment", id))
        .bearer_auth(app.user_token())
        .json(&json!({ "screenshotUrl": "https://cdn.example/shot.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status(), 200);
    assert_eq!(app.booking(id).await["payment"]["status"], "pending_verification");

    let missing_reason = app
        .put(&format!("/bookings/{}/verify-tier-payment", id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "approve": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_reason.status(), 400);

    let rejected = app
        .put(&format!("/bookings/{}/verify-tier-payment", id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "approve": false, "rejectionReason": "blurry image" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 200);

    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "cancelled");
    assert_eq!(booking["payment"]["status"], "failed");
    assert_eq!(booking["tierPayment"]["verificationStatus"], "rejected");
    assert_eq!(booking["tierPayment"]["rejectionReason"], "blurry image");

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn owner_approves_tier_screenshot() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Tier).await;
    let body = app.book_ok(&turf, &["15:00"], "online").await;
    let id = body["booking"]["id"].as_str().unwrap();

    app.post(&format!("/bookings/{}/tier-payment", id))
        .bearer_auth(app.user_token())
        .json(&json!({ "screenshotUrl": "https://cdn.example/shot.png" }))
        .send()
        .await
        .unwrap();

    let approved = app
        .put(&format!("/bookings/{}/verify-tier-payment", id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(approved.status(), 200);

    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["payment"]["status"], "completed");

    // A second decision finds the booking already confirmed
    let again = app
        .put(&format!("/bookings/{}/verify-tier-payment", id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn admin_approval_of_platform_proof_records_transaction() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["12:00", "13:00"], "platform_qr").await;
    let id = body["booking"]["id"].as_str().unwrap();
    assert_eq!(body["platformPayment"]["amount"], 200_000);

    let submit = app
        .post(&format!("/transactions/submit-proof/{}", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "screenshotUrl": "https://cdn.example/proof.png",
            "paymentReference": "UTR123456",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status(), 200);

    let verify = app
        .post(&format!("/transactions/verify/{}", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), 200);
    let body: Value = verify.json().await.unwrap();
    let transaction = &body["transaction"];
    assert_eq!(transaction["amount"], 200_000);
    assert_eq!(transaction["commissionBps"], 1_000);
    assert_eq!(transaction["platformCommission"], 20_000);
    assert_eq!(transaction["ownerAmount"], 180_000);
    assert_eq!(transaction["payout"]["status"], "pending");
    assert_eq!(body["booking"]["status"], "confirmed");

    // The owner can read it; another owner cannot
    let tx_id = transaction["id"].as_str().unwrap();
    let own = app
        .get(&format!("/transactions/{}", tx_id))
        .bearer_auth(app.owner_token())
        .send()
        .await
        .unwrap();
    assert_eq!(own.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn approval_that_loses_the_transaction_insert_leaves_booking_pending() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["15:00"], "platform_qr").await;
    let id = body["booking"]["id"].as_str().unwrap();

    app.post(&format!("/transactions/submit-proof/{}", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "screenshotUrl": "https://cdn.example/proof.png",
            "paymentReference": "UTR777",
        }))
        .send()
        .await
        .unwrap()
        .error_for_status()
        .expect("proof submission failed");

    // A concurrent approval already recorded the transaction
    let booking = app.db.bookings().find_by_id(id).await.unwrap().unwrap();
    let existing = Transaction::for_booking(
        &booking,
        "UTR777",
        "https://cdn.example/proof.png",
        "admin-2",
    );
    app.db.transactions().insert(&existing).await.unwrap();

    let verify = app
        .post(&format!("/transactions/verify/{}", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), 409);

    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["payment"]["status"], "pending_verification");
    let recorded = app
        .db
        .transactions()
        .find_by_booking(id)
        .await
        .unwrap()
        .expect("transaction kept");
    assert_eq!(recorded.id, existing.id);

    app.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires MongoDB
async fn rejected_platform_proof_cancels_with_default_reason() {
    let app = TestApp::spawn().await;
    let turf = app.seed_turf(PaymentPlan::Commission).await;
    let body = app.book_ok(&turf, &["14:00"], "platform_qr").await;
    let id = body["booking"]["id"].as_str().unwrap();

    app.post(&format!("/transactions/submit-proof/{}", id))
        .bearer_auth(app.user_token())
        .json(&json!({
            "screenshotUrl": "https://cdn.example/proof.png",
            "paymentReference": "UTR999",
        }))
        .send()
        .await
        .unwrap();

    let verify = app
        .post(&format!("/transactions/verify/{}", id))
        .bearer_auth(app.admin_token())
        .json(&json!({ "approve": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status(), 200);

    let booking = app.booking(id).await;
    assert_eq!(booking["status"], "cancelled");
    assert_eq!(booking["cancellation"]["cancelledBy"], "admin");
    assert_eq!(
        booking["platformProof"]["rejectionReason"],
        "Payment could not be verified"
    );

    // Non-admins cannot review proofs
    let forbidden = app
        .post(&format!("/transactions/verify/{}", id))
        .bearer_auth(app.owner_token())
        .json(&json!({ "approve": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    app.cleanup().await;
}
