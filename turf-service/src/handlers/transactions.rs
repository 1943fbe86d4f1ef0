//! Platform QR payments and the transaction ledger.
//!
//! The customer pays the platform's QR and submits proof; an admin reviews it.
//! Approval records a Transaction carrying the commission split priced into the booking.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use mongodb::bson::{self, doc, DateTime};
use service_core::error::AppError;
use validator::Validate;

use super::load_booking;
use super::payouts::{pay_out_booking, ALREADY_PAID_MESSAGE};
use crate::dtos::{
    BookingEnvelope, BookingResponse, DataResponse, PagedResponse, ProofReviewResponse,
    ReviewDecisionRequest, SubmitProofRequest, TransactionListQuery, TransactionResponse,
    UpdateTransactionPayoutRequest,
};
use crate::middleware::AuthUser;
use crate::models::{
    BookingEvent, BookingStatus, PaymentMethod, PaymentStatus, PayoutStatus, PlatformProof,
    Transaction, TransactionPayoutStatus,
};
use crate::services::lifecycle::{
    apply_event, cancellation_record, ensure_allowed, ensure_method, CONCURRENT_UPDATE_MESSAGE,
};
use crate::services::repository::Page;
use crate::services::metrics;
use crate::AppState;

const DEFAULT_REJECTION: &str = "Payment could not be verified";

pub async fn submit_proof(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<SubmitProofRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let booking = load_booking(&state, &booking_id).await?;
    if booking.user_id != user.user_id {
        return Err(AppError::forbidden("This booking belongs to another user"));
    }
    ensure_method(&booking, PaymentMethod::PlatformQr)?;
    ensure_allowed(&booking, BookingEvent::PaymentConfirmed)?;

    let proof = PlatformProof {
        screenshot_url: payload.screenshot_url,
        payment_reference: payload.payment_reference.trim().to_string(),
        submitted_at: DateTime::now(),
        rejection_reason: None,
        transaction_id: None,
        reviewed_by: None,
        reviewed_at: None,
    };

    let updated = state
        .db
        .bookings()
        .update_guarded(
            &booking_id,
            doc! {
                "status": BookingStatus::Pending.as_str(),
                "payment.method": PaymentMethod::PlatformQr.as_str(),
            },
            doc! {
                "platform_proof": bson::to_bson(&proof)?,
                "payment.status": PaymentStatus::PendingVerification.as_str(),
            },
        )
        .await?
        .ok_or_else(|| AppError::conflict(CONCURRENT_UPDATE_MESSAGE))?;

    tracing::info!(
        booking_id = %booking_id,
        payment_reference = %proof.payment_reference,
        "Platform payment proof submitted"
    );
    Ok(Json(BookingEnvelope::new(
        "Payment proof submitted for review",
        &updated,
    )))
}

pub async fn verify_proof(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;

    let booking = load_booking(&state, &booking_id).await?;
    ensure_method(&booking, PaymentMethod::PlatformQr)?;
    let proof = booking
        .platform_proof
        .clone()
        .ok_or_else(|| AppError::bad_request("No payment proof has been submitted for this booking"))?;

    let now = DateTime::now();
    if !payload.approve {
        let reason = payload.reason().unwrap_or(DEFAULT_REJECTION);
        let cancellation = cancellation_record("admin", reason)?;
        let updated = apply_event(
            &state.db,
            &booking,
            BookingEvent::PaymentRejected,
            doc! {
                "platform_proof.rejection_reason": reason,
                "platform_proof.reviewed_by": &user.user_id,
                "platform_proof.reviewed_at": now,
                "payment.status": PaymentStatus::Failed.as_str(),
                "cancellation": cancellation,
            },
        )
        .await?;
        metrics::record_verification("platform_qr", "rejected");

        return Ok(Json(ProofReviewResponse {
            success: true,
            message: "Payment proof rejected, booking cancelled".to_string(),
            booking: BookingResponse::from(&updated),
            transaction: None,
        }));
    }

    ensure_allowed(&booking, BookingEvent::PaymentConfirmed)?;
    let transaction = Transaction::for_booking(
        &booking,
        &proof.payment_reference,
        &proof.screenshot_url,
        &user.user_id,
    );
    // a second approval of the same booking stops here on the unique booking_id index
    state.db.transactions().insert(&transaction).await?;

    let confirmed = apply_event(
        &state.db,
        &booking,
        BookingEvent::PaymentConfirmed,
        doc! {
            "platform_proof.transaction_id": &transaction.id,
            "platform_proof.reviewed_by": &user.user_id,
            "platform_proof.reviewed_at": now,
            "payment.status": PaymentStatus::Completed.as_str(),
            "payment.paid_at": now,
        },
    )
    .await;
    let updated = match confirmed {
        Ok(updated) => updated,
        Err(err) => {
            state.db.transactions().delete(&transaction.id).await?;
            return Err(err);
        }
    };
    metrics::record_verification("platform_qr", "approved");

    tracing::info!(
        booking_id = %booking_id,
        transaction_id = %transaction.id,
        platform_commission = transaction.platform_commission,
        owner_amount = transaction.owner_amount,
        "Platform payment verified"
    );

    Ok(Json(ProofReviewResponse {
        success: true,
        message: "Payment verified, booking confirmed".to_string(),
        booking: BookingResponse::from(&updated),
        transaction: Some(TransactionResponse::from(&transaction)),
    }))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .db
        .transactions()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    user.require_owner_or_admin(&transaction.owner_id)?;

    Ok(Json(DataResponse::new(TransactionResponse::from(&transaction))))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TransactionListQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;

    let page = Page::new(query.page, query.page_size);
    let (transactions, total) = state
        .db
        .transactions()
        .list(query.payout_status, page)
        .await?;

    Ok(Json(PagedResponse {
        success: true,
        data: transactions.iter().map(TransactionResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn update_payout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTransactionPayoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;

    let transaction = state
        .db
        .transactions()
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    // the booking ledger decides whether the owner has been paid
    let booking = load_booking(&state, &transaction.booking_id).await?;
    if booking.payout_status == PayoutStatus::Paid {
        return Err(AppError::conflict(ALREADY_PAID_MESSAGE));
    }

    let from = transaction.payout.status;
    let to = payload.status;
    if !from.can_move_to(to) {
        return Err(AppError::bad_request(format!(
            "Payout cannot move from {} to {}",
            from.as_str(),
            to.as_str()
        )));
    }

    let reference = payload
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if to == TransactionPayoutStatus::Completed && reference.is_none() {
        return Err(AppError::bad_request(
            "reference is required to complete a payout",
        ));
    }

    let note = payload
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let updated = match (to, reference) {
        (TransactionPayoutStatus::Completed, Some(reference)) => {
            pay_out_booking(&state, &booking.id, reference, note, &user.user_id).await?;
            state.db.transactions().find_by_id(&id).await?
        }
        _ => {
            state
                .db
                .transactions()
                .update_payout(&id, from, to, reference, note)
                .await?
        }
    }
    .ok_or_else(|| AppError::conflict("Transaction payout was updated by another request"))?;

    tracing::info!(
        transaction_id = %id,
        from = from.as_str(),
        to = to.as_str(),
        updated_by = %user.user_id,
        "Transaction payout updated"
    );
    Ok(Json(DataResponse::new(TransactionResponse::from(&updated))))
}
