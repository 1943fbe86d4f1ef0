//! HTTP handlers for turf-service.

pub mod bookings;
pub mod payouts;
pub mod settings;
pub mod subscriptions;
pub mod tier_payments;
pub mod transactions;
pub mod turfs;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use serde_json::json;
use service_core::error::AppError;

use crate::models::{Booking, BookingStatus, Turf, TransitionError};
use crate::services::get_metrics;
use crate::services::pricing::AmountOverflow;
use crate::services::slots::SlotError;
use crate::AppState;

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::bad_request(format!("Cannot {} a booking that is {}", err.event, err.from))
    }
}

impl From<AmountOverflow> for AppError {
    fn from(err: AmountOverflow) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

/// Liveness check. Does not touch MongoDB.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "turf-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready" })),
            )
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("date must be in YYYY-MM-DD format"))
}

pub(crate) fn parse_status(value: Option<&str>) -> Result<Option<BookingStatus>, AppError> {
    value
        .map(|s| {
            BookingStatus::from_string(s)
                .ok_or_else(|| AppError::bad_request(format!("Unknown booking status '{}'", s)))
        })
        .transpose()
}

pub(crate) async fn load_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    state
        .db
        .bookings()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))
}

pub(crate) async fn load_turf(state: &AppState, id: &str) -> Result<Turf, AppError> {
    state
        .db
        .turfs()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Turf not found"))
}
