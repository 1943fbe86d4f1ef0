//! Status changes for bookings.
//!
//! Every path that moves a booking calls `apply_event`: the state machine decides
//! the target, the write is conditional on the status the caller saw, slot locks
//! are released when the booking stops holding slots, and the turf's booking
//! counter moves when a booking becomes confirmed.

use mongodb::bson::{self, Bson, DateTime, Document};
use service_core::error::AppError;

use crate::models::{Booking, BookingEvent, BookingStatus, CancellationRecord, PaymentMethod};
use crate::services::MongoDb;

pub const CONCURRENT_UPDATE_MESSAGE: &str = "Booking was updated by another request, please retry";

/// A cancellation record stamped now, ready for a `$set`.
pub fn cancellation_record(cancelled_by: &str, reason: &str) -> Result<Bson, AppError> {
    Ok(bson::to_bson(&CancellationRecord {
        cancelled_by: cancelled_by.to_string(),
        reason: reason.to_string(),
        cancelled_at: DateTime::now(),
    })?)
}

/// Checks that `booking` was created for the payment path being used.
pub fn ensure_method(booking: &Booking, expected: PaymentMethod) -> Result<(), AppError> {
    if booking.payment.method == expected {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "Booking is paid via {}, not {}",
            booking.payment.method.as_str(),
            expected.as_str()
        )))
    }
}

/// Fails with 400 when the booking cannot take `event` in its current status.
pub fn ensure_allowed(booking: &Booking, event: BookingEvent) -> Result<BookingStatus, AppError> {
    booking.status.transition(event).map_err(AppError::from)
}

pub async fn apply_event(
    db: &MongoDb,
    booking: &Booking,
    event: BookingEvent,
    set: Document,
) -> Result<Booking, AppError> {
    let from = booking.status;
    let to = ensure_allowed(booking, event)?;

    let updated = db
        .bookings()
        .transition(&booking.id, from, to, set)
        .await?
        .ok_or_else(|| {
            tracing::warn!(booking_id = %booking.id, %from, %to, "Lost race on booking status");
            AppError::conflict(CONCURRENT_UPDATE_MESSAGE)
        })?;

    if from.holds_slots() && !to.holds_slots() {
        db.slot_locks().release(&booking.id).await?;
    }
    if to == BookingStatus::Confirmed {
        db.turfs().increment_bookings(&booking.turf_id).await?;
    }

    tracing::info!(booking_id = %booking.id, %from, %to, "Booking status changed");
    Ok(updated)
}
