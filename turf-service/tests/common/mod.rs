#![allow(dead_code)]

use chrono::{Duration, Utc};
use reqwest::{RequestBuilder, Response};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use turf_service::config::{
    CorsConfig, JwtConfig, MongoConfig, RazorpayConfig, TurfConfig, VenueConfig,
};
use turf_service::models::{Address, NewTurf, PaymentPlan, Turf, TurfStatus, WeeklyHours};
use turf_service::services::{MongoDb, Role};
use turf_service::{AppState, Application};
use wiremock::MockServer;

pub const RAZORPAY_KEY_ID: &str = "rzp_test_key";
pub const RAZORPAY_KEY_SECRET: &str = "rzp_test_secret";

pub const OWNER_ID: &str = "owner-1";
pub const USER_ID: &str = "user-1";
pub const OTHER_USER_ID: &str = "user-2";
pub const ADMIN_ID: &str = "admin-1";

pub struct TestApp {
    pub address: String,
    pub db: MongoDb,
    pub state: AppState,
    pub razorpay: MockServer,
    client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let razorpay = MockServer::start().await;
        let db_name = format!("turf_test_{}", uuid::Uuid::new_v4().simple());

        let config = TurfConfig {
            common: CommonConfig {
                port: 0,
                environment: "test".to_string(),
            },
            service_name: "turf-service-test".to_string(),
            log_level: "error".to_string(),
            otlp_endpoint: None,
            mongodb: MongoConfig {
                uri: std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                database: db_name,
            },
            jwt: JwtConfig {
                secret: Secret::new("test-jwt-secret".to_string()),
            },
            razorpay: RazorpayConfig {
                key_id: RAZORPAY_KEY_ID.to_string(),
                key_secret: Secret::new(RAZORPAY_KEY_SECRET.to_string()),
                api_base_url: razorpay.uri(),
                request_timeout_secs: 5,
            },
            venue: VenueConfig {
                utc_offset_minutes: 330,
            },
            cors: CorsConfig {
                allowed_origins: vec![],
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.http_port());
        let db = app.db().clone();
        let state = app.state();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            db,
            state,
            razorpay,
            client,
        }
    }

    pub fn token(&self, user_id: &str, role: Role) -> String {
        self.state
            .jwt
            .issue(user_id, role, Duration::hours(1))
            .expect("Failed to issue token")
    }

    pub fn user_token(&self) -> String {
        self.token(USER_ID, Role::User)
    }

    pub fn owner_token(&self) -> String {
        self.token(OWNER_ID, Role::Owner)
    }

    pub fn admin_token(&self) -> String {
        self.token(ADMIN_ID, Role::Admin)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.address, path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(format!("{}{}", self.address, path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(format!("{}{}", self.address, path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(format!("{}{}", self.address, path))
    }

    /// An approved turf open 06:00-23:00 every day with one-hour slots at 1000 INR.
    pub async fn seed_turf(&self, plan: PaymentPlan) -> Turf {
        let mut turf = Turf::new(NewTurf {
            owner_id: OWNER_ID.to_string(),
            name: "Green Field Arena".to_string(),
            description: None,
            address: Address {
                line: "12 MG Road".to_string(),
                city: "Pune".to_string(),
                state: Some("Maharashtra".to_string()),
                pincode: None,
            },
            location: None,
            sports: vec!["football".to_string(), "cricket".to_string()],
            weekday_rate: 100_000,
            weekend_rate: 100_000,
            operating_hours: WeeklyHours::every_day("06:00", "23:00"),
            slot_duration_minutes: 60,
            payment_plan: plan,
            owner_qr_url: Some("https://cdn.example/owner-qr.png".to_string()),
        });
        turf.status = TurfStatus::Approved;
        self.db
            .turfs()
            .insert(&turf)
            .await
            .expect("Failed to seed turf");
        turf
    }

    /// Books `starts` on `turf` three days from now and returns the response.
    pub async fn book(
        &self,
        token: &str,
        turf: &Turf,
        starts: &[&str],
        payment_method: &str,
    ) -> Response {
        let slots: Vec<Value> = starts
            .iter()
            .map(|s| serde_json::json!({ "startTime": s, "endTime": "" }))
            .collect();
        self.post("/bookings")
            .bearer_auth(token)
            .json(&serde_json::json!({
                "turfId": turf.id,
                "date": booking_date(),
                "timeSlots": slots,
                "sport": "football",
                "playerDetails": { "name": "Asha", "phone": "9876543210" },
                "paymentMethod": payment_method,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Books as the default user, asserting success, and returns the response body.
    pub async fn book_ok(&self, turf: &Turf, starts: &[&str], payment_method: &str) -> Value {
        let response = self
            .book(&self.user_token(), turf, starts, payment_method)
            .await;
        assert_eq!(response.status(), 201);
        response.json().await.expect("Failed to parse response")
    }

    pub async fn booking(&self, id: &str) -> Value {
        let response = self
            .get(&format!("/bookings/{}", id))
            .bearer_auth(self.admin_token())
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"].clone()
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .database()
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}

/// A date far enough ahead that every slot is bookable and cancellable.
pub fn booking_date() -> String {
    (Utc::now() + Duration::days(3))
        .format("%Y-%m-%d")
        .to_string()
}
