//! Tier turfs: the customer pays the owner's QR directly and uploads a screenshot;
//! the owner confirms or rejects it.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use mongodb::bson::{self, doc, DateTime};
use service_core::error::AppError;
use validator::Validate;

use super::load_booking;
use crate::dtos::{BookingEnvelope, ReviewDecisionRequest, UploadScreenshotRequest};
use crate::middleware::AuthUser;
use crate::models::{
    BookingEvent, BookingStatus, PaymentMethod, PaymentStatus, TierPayment, VerificationStatus,
};
use crate::services::lifecycle::{
    apply_event, cancellation_record, ensure_allowed, ensure_method, CONCURRENT_UPDATE_MESSAGE,
};
use crate::services::metrics;
use crate::AppState;

pub async fn upload_screenshot(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<UploadScreenshotRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let booking = load_booking(&state, &booking_id).await?;
    if booking.user_id != user.user_id {
        return Err(AppError::forbidden("This booking belongs to another user"));
    }
    ensure_method(&booking, PaymentMethod::TierScreenshot)?;
    ensure_allowed(&booking, BookingEvent::PaymentConfirmed)?;

    let upload = TierPayment {
        screenshot_url: payload.screenshot_url,
        uploaded_at: DateTime::now(),
        verification_status: VerificationStatus::Pending,
        rejection_reason: None,
        verified_by: None,
        verified_at: None,
    };

    let updated = state
        .db
        .bookings()
        .update_guarded(
            &booking_id,
            doc! {
                "status": BookingStatus::Pending.as_str(),
                "payment.method": PaymentMethod::TierScreenshot.as_str(),
            },
            doc! {
                "tier_payment": bson::to_bson(&upload)?,
                "payment.status": PaymentStatus::PendingVerification.as_str(),
            },
        )
        .await?
        .ok_or_else(|| AppError::conflict(CONCURRENT_UPDATE_MESSAGE))?;

    tracing::info!(booking_id = %booking_id, "Tier payment screenshot uploaded");
    Ok(Json(BookingEnvelope::new(
        "Payment screenshot uploaded, awaiting owner verification",
        &updated,
    )))
}

pub async fn verify_screenshot(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let booking = load_booking(&state, &booking_id).await?;
    user.require_owner_or_admin(&booking.owner_id)?;
    ensure_method(&booking, PaymentMethod::TierScreenshot)?;
    if booking.tier_payment.is_none() {
        return Err(AppError::bad_request(
            "No payment screenshot has been uploaded for this booking",
        ));
    }

    let now = DateTime::now();
    if payload.approve {
        let updated = apply_event(
            &state.db,
            &booking,
            BookingEvent::PaymentConfirmed,
            doc! {
                "tier_payment.verification_status": VerificationStatus::Approved.as_str(),
                "tier_payment.verified_by": &user.user_id,
                "tier_payment.verified_at": now,
                "payment.status": PaymentStatus::Completed.as_str(),
                "payment.paid_at": now,
            },
        )
        .await?;
        metrics::record_verification("tier", "approved");
        return Ok(Json(BookingEnvelope::new(
            "Payment approved, booking confirmed",
            &updated,
        )));
    }

    let reason = payload
        .reason()
        .ok_or_else(|| AppError::bad_request("rejectionReason is required when rejecting"))?;
    let cancellation = cancellation_record("owner", reason)?;
    let updated = apply_event(
        &state.db,
        &booking,
        BookingEvent::PaymentRejected,
        doc! {
            "tier_payment.verification_status": VerificationStatus::Rejected.as_str(),
            "tier_payment.rejection_reason": reason,
            "tier_payment.verified_by": &user.user_id,
            "tier_payment.verified_at": now,
            "payment.status": PaymentStatus::Failed.as_str(),
            "cancellation": cancellation,
        },
    )
    .await?;
    metrics::record_verification("tier", "rejected");

    Ok(Json(BookingEnvelope::new(
        "Payment rejected, booking cancelled",
        &updated,
    )))
}
