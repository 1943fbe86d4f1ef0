use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mongodb::bson::{self, doc, DateTime};
use serde_json::json;
use service_core::error::AppError;
use validator::Validate;

use super::{load_booking, load_turf, parse_date, parse_status};
use crate::dtos::{
    BookingEnvelope, BookingListQuery, BookingResponse, CancelBookingRequest,
    CreateBookingRequest, CreateBookingResponse, DataResponse, GatewayRefundDto, OutcomeStatus,
    OwnerBookingQuery, OwnerQrDto, PaymentChoice, PlatformPaymentDto, RazorpayOrderDto,
    RefundDecisionRequest, RefundDecisionResponse, UpdateBookingStatusRequest,
    VerifyPaymentRequest,
};
use crate::middleware::AuthUser;
use crate::models::{
    Booking, BookingEvent, BookingStatus, GatewayRefund, GatewayRefundStatus, NewBooking,
    PaymentMethod, PaymentPlan, PaymentStatus, RefundRequest,
};
use crate::services::lifecycle::{apply_event, cancellation_record, ensure_allowed, ensure_method};
use crate::services::razorpay::RazorpayOrder;
use crate::services::repository::BookingFilter;
use crate::services::slots::{self, CANCELLATION_NOTICE_HOURS};
use crate::services::{metrics, pricing, Role};
use crate::AppState;

fn resolve_method(choice: PaymentChoice, plan: PaymentPlan) -> PaymentMethod {
    match (choice, plan) {
        (PaymentChoice::CashAtTurf, _) => PaymentMethod::CashAtTurf,
        (_, PaymentPlan::Tier) => PaymentMethod::TierScreenshot,
        (PaymentChoice::PlatformQr, _) => PaymentMethod::PlatformQr,
        (PaymentChoice::Online, _) => PaymentMethod::Online,
    }
}

async fn open_order(state: &AppState, booking: &Booking) -> Result<RazorpayOrder, AppError> {
    if !state.razorpay.is_configured() {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Online payments are not configured"
        )));
    }

    state
        .razorpay
        .create_order(
            booking.pricing.total_amount,
            &booking.id,
            Some(json!({ "booking_id": booking.id, "turf_id": booking.turf_id })),
        )
        .await
        .map_err(|e| {
            tracing::error!(booking_id = %booking.id, error = %e, "Failed to create Razorpay order");
            AppError::BadGateway("Could not start online payment".to_string())
        })
}

pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let turf = load_turf(&state, &payload.turf_id).await?;
    if !turf.is_bookable() {
        return Err(AppError::not_found("Turf not found"));
    }

    let player_details = payload
        .player_details
        .clone()
        .ok_or_else(|| AppError::bad_request("playerDetails is required"))?;
    player_details.validate()?;
    let sport = payload.sport.trim();
    if sport.is_empty() {
        return Err(AppError::bad_request("sport is required"));
    }

    let date = parse_date(&payload.date)?;
    let time_slots = slots::resolve_requested(
        &turf,
        date,
        &payload.requested_starts(),
        &state.clock,
        Utc::now(),
    )?;
    if !turf.supports_sport(sport) {
        return Err(AppError::bad_request(format!(
            "{} is not offered at this turf",
            sport
        )));
    }

    let settings = state.db.settings().get().await?;
    let method = resolve_method(payload.payment_method, turf.payment_plan);
    let price = pricing::calculate(
        turf.rate_for(date),
        time_slots.len() as u32,
        turf.payment_plan,
        settings.commission_bps,
    )?;

    let mut booking = Booking::new(NewBooking {
        turf_id: turf.id.clone(),
        owner_id: turf.owner_id.clone(),
        user_id: user.user_id.clone(),
        date,
        time_slots,
        sport: sport.to_string(),
        player_details: player_details.into(),
        notes: payload.notes.clone(),
        pricing: price,
        method,
    });

    let locks = state.db.slot_locks();
    if let Err(e) = locks
        .acquire(&booking.id, &booking.turf_id, date, &booking.time_slots)
        .await
    {
        metrics::record_booking(method.as_str(), "slot_taken");
        return Err(e);
    }

    let order = if method == PaymentMethod::Online {
        match open_order(&state, &booking).await {
            Ok(order) => {
                booking.payment.razorpay_order_id = Some(order.id.clone());
                Some(order)
            }
            Err(e) => {
                locks.release(&booking.id).await?;
                metrics::record_booking(method.as_str(), "payment_setup_failed");
                return Err(e);
            }
        }
    } else {
        None
    };

    if let Err(e) = state.db.bookings().insert(&booking).await {
        locks.release(&booking.id).await?;
        return Err(e);
    }
    if booking.status == BookingStatus::Confirmed {
        state.db.turfs().increment_bookings(&turf.id).await?;
    }

    metrics::record_booking(method.as_str(), "created");
    tracing::info!(
        booking_id = %booking.id,
        turf_id = %turf.id,
        user_id = %user.user_id,
        slots = booking.time_slots.len(),
        total = booking.pricing.total_amount,
        method = method.as_str(),
        "Booking created"
    );

    let total = booking.pricing.total_amount;
    let response = CreateBookingResponse {
        success: true,
        payment_method: method,
        razorpay_order: order.map(|o| RazorpayOrderDto {
            order_id: o.id,
            amount: o.amount,
            currency: o.currency,
            key_id: state.razorpay.key_id().to_string(),
        }),
        owner_qr: (method == PaymentMethod::TierScreenshot).then(|| OwnerQrDto {
            qr_url: turf.owner_qr_url.clone(),
            amount: total,
        }),
        platform_payment: (method == PaymentMethod::PlatformQr)
            .then(|| PlatformPaymentDto::from_settings(&settings, Some(total))),
        booking: BookingResponse::from(&booking),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = parse_status(query.status.as_deref())?;
    let bookings = state
        .db
        .bookings()
        .list_for_user(&user.user_id, status)
        .await?;
    Ok(Json(DataResponse::new(
        bookings.iter().map(BookingResponse::from).collect::<Vec<_>>(),
    )))
}

pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = load_booking(&state, &id).await?;
    if booking.user_id != user.user_id {
        user.require_owner_or_admin(&booking.owner_id)?;
    }
    Ok(Json(DataResponse::new(BookingResponse::from(&booking))))
}

pub async fn owner_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OwnerBookingQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&[Role::Owner])?;

    let filter = BookingFilter {
        turf_id: query.turf_id.filter(|t| !t.is_empty()),
        date: query.date.as_deref().map(parse_date).transpose()?,
        status: parse_status(query.status.as_deref())?,
    };
    let bookings = state
        .db
        .bookings()
        .list_for_owner(&user.user_id, &filter)
        .await?;
    Ok(Json(DataResponse::new(
        bookings.iter().map(BookingResponse::from).collect::<Vec<_>>(),
    )))
}

/// Checks the Razorpay checkout signature and settles the booking either way.
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let booking = load_booking(&state, &id).await?;
    if booking.user_id != user.user_id {
        return Err(AppError::forbidden("This booking belongs to another user"));
    }
    ensure_method(&booking, PaymentMethod::Online)?;
    ensure_allowed(&booking, BookingEvent::PaymentConfirmed)?;

    let order_id = booking
        .payment
        .razorpay_order_id
        .as_deref()
        .ok_or_else(|| AppError::bad_request("No payment order exists for this booking"))?;
    if payload.razorpay_order_id != order_id {
        tracing::warn!(booking_id = %id, "Client sent an order id that does not belong to this booking");
    }

    let is_valid = state
        .razorpay
        .verify_payment_signature(order_id, &payload.razorpay_payment_id, &payload.razorpay_signature)
        .unwrap_or_else(|e| {
            tracing::warn!(booking_id = %id, error = %e, "Malformed payment signature");
            false
        });

    if !is_valid {
        let cancellation = cancellation_record("system", "Payment signature verification failed")?;
        apply_event(
            &state.db,
            &booking,
            BookingEvent::PaymentRejected,
            doc! {
                "payment.status": PaymentStatus::Failed.as_str(),
                "cancellation": cancellation,
            },
        )
        .await?;
        metrics::record_verification("gateway", "rejected");
        return Err(AppError::bad_request("Payment verification failed"));
    }

    let updated = apply_event(
        &state.db,
        &booking,
        BookingEvent::PaymentConfirmed,
        doc! {
            "payment.status": PaymentStatus::Completed.as_str(),
            "payment.razorpay_payment_id": &payload.razorpay_payment_id,
            "payment.paid_at": DateTime::now(),
        },
    )
    .await?;
    metrics::record_verification("gateway", "confirmed");

    Ok(Json(BookingEnvelope::new(
        "Payment verified, booking confirmed",
        &updated,
    )))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = load_booking(&state, &id).await?;
    if booking.user_id != user.user_id {
        return Err(AppError::forbidden(
            "Only the customer who made this booking can cancel it",
        ));
    }

    let reason = payload.reason.trim();
    let qr_image_url = payload.qr_image_url.trim();
    if reason.is_empty() || qr_image_url.is_empty() {
        return Err(AppError::bad_request("reason and qrImageUrl are required"));
    }
    ensure_allowed(&booking, BookingEvent::RequestRefund)?;

    let first = booking.first_slot().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("Booking {} has no time slots", booking.id))
    })?;
    if !state
        .clock
        .allows_cancellation(booking.date, &first.start_time, Utc::now())
    {
        return Err(AppError::bad_request(format!(
            "Bookings can only be cancelled at least {} hours before the first slot",
            CANCELLATION_NOTICE_HOURS
        )));
    }

    let settings = state.db.settings().get().await?;
    let amount = pricing::refund_amount(
        booking.pricing.total_amount,
        booking.pricing.plan,
        settings.cancellation_fee_bps,
    )?;
    let request = RefundRequest {
        amount,
        reason: reason.to_string(),
        qr_image_url: qr_image_url.to_string(),
        requested_at: DateTime::now(),
        decided_by: None,
        decided_at: None,
        note: None,
        gateway_refund: None,
    };

    let set = doc! {
        "refund_request": bson::to_bson(&request)?,
        "cancellation": cancellation_record("user", reason)?,
    };
    let updated = apply_event(&state.db, &booking, BookingEvent::RequestRefund, set).await?;

    tracing::info!(booking_id = %id, refund_amount = amount, "Cancellation requested");
    Ok(Json(BookingEnvelope::new(
        "Booking cancelled, refund awaiting owner review",
        &updated,
    )))
}

async fn reverse_gateway_payment(
    state: &AppState,
    booking: &Booking,
    payment_id: &str,
    amount: i64,
) -> GatewayRefund {
    let notes = json!({ "booking_id": booking.id, "reason": "booking_cancelled" });
    match state.razorpay.refund_payment(payment_id, amount, Some(notes)).await {
        Ok(refund) => GatewayRefund {
            status: GatewayRefundStatus::Processed,
            refund_id: Some(refund.id),
            error: None,
            attempted_at: Some(DateTime::now()),
        },
        Err(e) => {
            tracing::error!(
                booking_id = %booking.id,
                payment_id,
                error = %e,
                "Gateway refund failed, owner must refund manually"
            );
            GatewayRefund {
                status: GatewayRefundStatus::Failed,
                refund_id: None,
                error: Some(e.to_string()),
                attempted_at: Some(DateTime::now()),
            }
        }
    }
}

/// Owner or admin decision on a pending refund.
pub async fn decide_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<RefundDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let booking = load_booking(&state, &id).await?;
    user.require_owner_or_admin(&booking.owner_id)?;

    let note = payload
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let mut set = doc! {
        "refund_request.decided_by": &user.user_id,
        "refund_request.decided_at": DateTime::now(),
        "refund_request.note": note,
    };

    if !payload.approve {
        let updated = apply_event(&state.db, &booking, BookingEvent::DenyRefund, set).await?;
        metrics::record_refund_decision("denied", "none");
        return Ok(Json(RefundDecisionResponse {
            success: true,
            message: "Refund request denied".to_string(),
            booking: BookingResponse::from(&updated),
            gateway_refund: None,
        }));
    }

    let amount = booking
        .refund_request
        .as_ref()
        .map(|r| r.amount)
        .ok_or_else(|| AppError::bad_request("Booking has no refund request"))?;

    let gateway_payment_id = match (
        booking.payment.method,
        booking.payment.status,
        booking.payment.razorpay_payment_id.as_deref(),
    ) {
        (PaymentMethod::Online, PaymentStatus::Completed, Some(payment_id)) => {
            Some(payment_id.to_string())
        }
        _ => None,
    };

    if gateway_payment_id.is_none() {
        let outcome = GatewayRefund {
            status: GatewayRefundStatus::NotApplicable,
            refund_id: None,
            error: None,
            attempted_at: None,
        };
        set.insert("refund_request.gateway_refund", bson::to_bson(&outcome)?);
        if booking.payment.status == PaymentStatus::Completed {
            set.insert("payment.status", PaymentStatus::Refunded.as_str());
        }
    }

    // The status write happens first so only one approval ever reaches the gateway.
    let mut updated = apply_event(&state.db, &booking, BookingEvent::ApproveRefund, set).await?;

    if let Some(payment_id) = gateway_payment_id {
        let outcome = reverse_gateway_payment(&state, &booking, &payment_id, amount).await;
        let recorded = bson::to_bson(&outcome)?;
        let mut set = doc! { "refund_request.gateway_refund": recorded };
        if outcome.status == GatewayRefundStatus::Processed {
            set.insert("payment.status", PaymentStatus::Refunded.as_str());
        }
        if let Some(booking) = state
            .db
            .bookings()
            .update_guarded(
                &booking.id,
                doc! { "status": BookingStatus::RefundCompleted.as_str() },
                set,
            )
            .await?
        {
            updated = booking;
        }
    }

    let gateway = updated
        .refund_request
        .as_ref()
        .and_then(|r| r.gateway_refund.as_ref());
    let gateway_label = match gateway.map(|g| g.status) {
        Some(GatewayRefundStatus::Processed) => "processed",
        Some(GatewayRefundStatus::Failed) => "failed",
        _ => "not_applicable",
    };
    metrics::record_refund_decision("approved", gateway_label);

    let message = if gateway_label == "failed" {
        "Refund approved, but the gateway refund failed and must be completed manually"
    } else {
        "Refund approved"
    };

    Ok(Json(RefundDecisionResponse {
        success: true,
        message: message.to_string(),
        gateway_refund: gateway.map(GatewayRefundDto::from),
        booking: BookingResponse::from(&updated),
    }))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = load_booking(&state, &id).await?;
    user.require_owner_or_admin(&booking.owner_id)?;

    let event = match payload.status {
        OutcomeStatus::Completed => BookingEvent::MarkCompleted,
        OutcomeStatus::NoShow => BookingEvent::MarkNoShow,
    };
    let updated = apply_event(&state.db, &booking, event, doc! {}).await?;

    Ok(Json(BookingEnvelope::new(
        format!("Booking marked {}", updated.status),
        &updated,
    )))
}

pub async fn mark_cash_received(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = load_booking(&state, &id).await?;
    user.require_owner_or_admin(&booking.owner_id)?;
    ensure_method(&booking, PaymentMethod::CashAtTurf)?;

    let updated = state
        .db
        .bookings()
        .update_guarded(
            &id,
            doc! {
                "payment.status": PaymentStatus::PendingCash.as_str(),
                "status": {
                    "$in": [BookingStatus::Confirmed.as_str(), BookingStatus::Completed.as_str()]
                },
            },
            doc! {
                "payment.status": PaymentStatus::Completed.as_str(),
                "payment.paid_at": DateTime::now(),
            },
        )
        .await?
        .ok_or_else(|| AppError::bad_request("Booking is not awaiting a cash payment"))?;

    metrics::record_verification("cash", "received");
    tracing::info!(booking_id = %id, received_by = %user.user_id, "Cash payment recorded");

    Ok(Json(BookingEnvelope::new("Cash payment recorded", &updated)))
}
