use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::BTreeSet;
use validator::Validate;

use super::load_booking;
use crate::dtos::{
    BookingEnvelope, BookingResponse, BulkPayoutResponse, MarkPayoutRequest, OwnerPayoutDto,
    PagedResponse, PayoutHistoryQuery, PendingPayoutsResponse,
};
use crate::middleware::AuthUser;
use crate::models::{Booking, PaymentMethod, PayoutStatus};
use crate::services::lifecycle::CONCURRENT_UPDATE_MESSAGE;
use crate::services::repository::Page;
use crate::services::{metrics, payouts};
use crate::AppState;

pub(super) const ALREADY_PAID_MESSAGE: &str = "Booking has already been paid out";

fn clean_note(note: Option<&str>) -> Option<&str> {
    note.map(str::trim).filter(|n| !n.is_empty())
}

/// Platform-collected money still owed to owners, grouped per owner.
pub async fn pending_payouts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;

    let bookings = state.db.bookings().pending_payouts().await?;
    let turf_ids: Vec<String> = bookings
        .iter()
        .map(|b| b.turf_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let names = state.db.turfs().names_by_ids(&turf_ids).await?;

    let owners = payouts::group_by_owner(&bookings, &names);
    let total_owner_earnings: i64 = owners.iter().map(|o| o.owner_earnings).sum();

    Ok(Json(PendingPayoutsResponse {
        success: true,
        total_bookings: bookings.len(),
        total_owner_earnings,
        owners: owners.into_iter().map(OwnerPayoutDto::from).collect(),
    }))
}

pub async fn mark_booking_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<MarkPayoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;
    let reference = payload.reference.trim();
    if reference.is_empty() {
        return Err(AppError::bad_request("reference is required"));
    }

    let booking = pay_out_booking(
        &state,
        &id,
        reference,
        clean_note(payload.note.as_deref()),
        &user.user_id,
    )
    .await?;

    metrics::record_payouts("single", 1);
    tracing::info!(
        booking_id = %id,
        owner_id = %booking.owner_id,
        amount = booking.pricing.owner_earnings,
        reference,
        "Payout recorded"
    );
    Ok(Json(BookingEnvelope::new("Payout recorded", &booking)))
}

/// Marks the booking paid and completes its platform QR transaction, if any.
/// `None` when the booking was not pending payout.
async fn record_payout(
    state: &AppState,
    booking_id: &str,
    reference: &str,
    note: Option<&str>,
    paid_by: &str,
) -> Result<Option<Booking>, AppError> {
    let Some(booking) = state
        .db
        .bookings()
        .mark_paid(booking_id, reference, note, paid_by)
        .await?
    else {
        return Ok(None);
    };
    if booking.payment.method == PaymentMethod::PlatformQr {
        state
            .db
            .transactions()
            .complete_for_booking(&booking.id, reference, note)
            .await?;
    }
    Ok(Some(booking))
}

/// Single-booking payout shared by the booking and transaction ledgers.
pub(super) async fn pay_out_booking(
    state: &AppState,
    booking_id: &str,
    reference: &str,
    note: Option<&str>,
    paid_by: &str,
) -> Result<Booking, AppError> {
    if let Some(booking) = record_payout(state, booking_id, reference, note, paid_by).await? {
        return Ok(booking);
    }

    let booking = load_booking(state, booking_id).await?;
    if booking.payout_status == PayoutStatus::Paid {
        Err(AppError::conflict(ALREADY_PAID_MESSAGE))
    } else if booking.is_payout_eligible() {
        Err(AppError::conflict(CONCURRENT_UPDATE_MESSAGE))
    } else {
        Err(AppError::bad_request("Booking is not eligible for payout"))
    }
}

/// Pays out every eligible booking of one owner under a single reference.
pub async fn mark_owner_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(owner_id): Path<String>,
    Json(payload): Json<MarkPayoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;
    let reference = payload.reference.trim();
    if reference.is_empty() {
        return Err(AppError::bad_request("reference is required"));
    }
    let note = clean_note(payload.note.as_deref());

    let candidates = state
        .db
        .bookings()
        .pending_payouts_for_owner(&owner_id)
        .await?;

    let mut count = 0_u64;
    let mut total_earnings = 0_i64;
    for booking in candidates {
        // guarded write: skips bookings paid out in the meantime
        if let Some(paid) =
            record_payout(&state, &booking.id, reference, note, &user.user_id).await?
        {
            count += 1;
            total_earnings += paid.pricing.owner_earnings;
        }
    }

    metrics::record_payouts("bulk", count);
    tracing::info!(%owner_id, count, total_earnings, reference, "Owner payout recorded");

    Ok(Json(BulkPayoutResponse {
        success: true,
        owner_id,
        count,
        total_earnings,
    }))
}

pub async fn payout_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PayoutHistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;

    let page = Page::new(query.page, query.page_size);
    let owner_id = query.owner_id.as_deref().filter(|o| !o.is_empty());
    let (bookings, total) = state.db.bookings().payout_history(owner_id, page).await?;

    Ok(Json(PagedResponse {
        success: true,
        data: bookings.iter().map(BookingResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
    }))
}

#[cfg(test)]
mod tests {
    use super::clean_note;

    #[test]
    fn blank_notes_are_dropped() {
        assert_eq!(clean_note(Some("  ")), None);
        assert_eq!(clean_note(Some(" NEFT ")), Some("NEFT"));
        assert_eq!(clean_note(None), None);
    }
}
