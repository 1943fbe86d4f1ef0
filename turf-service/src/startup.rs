//! Application startup and lifecycle management.

use crate::config::TurfConfig;
use crate::handlers;
use crate::services::{JwtService, MongoDb, RazorpayClient, VenueClock};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: MongoDb,
    pub razorpay: RazorpayClient,
    pub jwt: JwtService,
    pub clock: VenueClock,
    pub config: TurfConfig,
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: TurfConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let razorpay = RazorpayClient::new(config.razorpay.clone())?;
        if razorpay.is_configured() {
            tracing::info!("Razorpay client initialized");
        } else {
            tracing::warn!("Razorpay credentials not configured - online payments are disabled");
        }

        let jwt = JwtService::new(&config.jwt);
        let clock = VenueClock::new(config.venue.utc_offset_minutes).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid venue offset: {}", e))
        })?;

        let state = AppState {
            db,
            razorpay,
            jwt,
            clock,
            config: config.clone(),
        };

        // Port 0 binds a random port, used by the integration tests
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Turf service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = router(self.state);
        axum::serve(self.http_listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        // Turfs
        .route(
            "/turfs",
            get(handlers::turfs::list_turfs).post(handlers::turfs::create_turf),
        )
        .route(
            "/turfs/:id",
            get(handlers::turfs::get_turf)
                .put(handlers::turfs::update_turf)
                .delete(handlers::turfs::delete_turf),
        )
        .route(
            "/turfs/:id/available-slots",
            get(handlers::turfs::available_slots),
        )
        .route("/owner/turfs", get(handlers::turfs::owner_turfs))
        .route(
            "/admin/turfs/:id/status",
            put(handlers::turfs::update_turf_status),
        )
        // Bookings
        .route("/bookings", post(handlers::bookings::create_booking))
        .route("/bookings/my", get(handlers::bookings::my_bookings))
        .route("/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/bookings/:id/verify-payment",
            post(handlers::bookings::verify_payment),
        )
        .route("/bookings/:id/cancel", put(handlers::bookings::cancel_booking))
        .route("/bookings/:id/refund", put(handlers::bookings::decide_refund))
        .route(
            "/bookings/:id/status",
            put(handlers::bookings::update_booking_status),
        )
        .route(
            "/bookings/:id/cash-received",
            put(handlers::bookings::mark_cash_received),
        )
        .route(
            "/bookings/:id/tier-payment",
            post(handlers::tier_payments::upload_screenshot),
        )
        .route(
            "/bookings/:id/verify-tier-payment",
            put(handlers::tier_payments::verify_screenshot),
        )
        .route("/owner/bookings", get(handlers::bookings::owner_bookings))
        // Platform QR proofs and the transaction ledger
        .route(
            "/transactions/submit-proof/:id",
            post(handlers::transactions::submit_proof),
        )
        .route(
            "/transactions/verify/:id",
            post(handlers::transactions::verify_proof),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/admin/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/admin/transactions/:id/payout",
            put(handlers::transactions::update_payout),
        )
        // Owner payouts
        .route(
            "/admin/payouts/pending",
            get(handlers::payouts::pending_payouts),
        )
        .route(
            "/admin/payouts/history",
            get(handlers::payouts::payout_history),
        )
        .route(
            "/admin/payouts/owners/:id",
            put(handlers::payouts::mark_owner_paid),
        )
        .route(
            "/admin/bookings/:id/payout",
            put(handlers::payouts::mark_booking_paid),
        )
        // Subscriptions
        .route(
            "/subscriptions/plans",
            get(handlers::subscriptions::list_plans),
        )
        .route(
            "/subscriptions",
            post(handlers::subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/my",
            get(handlers::subscriptions::my_subscriptions),
        )
        .route(
            "/subscriptions/:id/cancel",
            put(handlers::subscriptions::cancel_subscription),
        )
        .route(
            "/admin/subscriptions/:id/verify",
            post(handlers::subscriptions::verify_subscription),
        )
        // Platform settings
        .route("/settings/payment", get(handlers::settings::payment_details))
        .route(
            "/admin/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(cors_layer(&state.config.cors.allowed_origins))
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

