//! Booking document and its lifecycle.
//!
//! `BookingStatus::transition` is the only place that decides whether a status
//! change is legal; repositories persist the result with a conditional update on
//! the prior status.

use chrono::NaiveDate;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::turf::PaymentPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
    PendingRefund,
    RefundCompleted,
    RefundDenied,
}

/// Things that happen to a booking after it has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    PaymentConfirmed,
    PaymentRejected,
    RequestRefund,
    ApproveRefund,
    DenyRefund,
    MarkCompleted,
    MarkNoShow,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply '{event}' to a booking that is {from}")]
pub struct TransitionError {
    pub from: BookingStatus,
    pub event: BookingEvent,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
        BookingStatus::NoShow,
        BookingStatus::PendingRefund,
        BookingStatus::RefundCompleted,
        BookingStatus::RefundDenied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
            BookingStatus::PendingRefund => "pending_refund",
            BookingStatus::RefundCompleted => "refund_completed",
            BookingStatus::RefundDenied => "refund_denied",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// The transition table.
    pub fn transition(self, event: BookingEvent) -> Result<BookingStatus, TransitionError> {
        use BookingEvent as E;
        use BookingStatus as S;

        match (self, event) {
            (S::Pending, E::PaymentConfirmed) => Ok(S::Confirmed),
            (S::Pending, E::PaymentRejected) => Ok(S::Cancelled),
            (S::Pending | S::Confirmed, E::RequestRefund) => Ok(S::PendingRefund),
            (S::PendingRefund, E::ApproveRefund) => Ok(S::RefundCompleted),
            (S::PendingRefund, E::DenyRefund) => Ok(S::RefundDenied),
            (S::Confirmed, E::MarkCompleted) => Ok(S::Completed),
            (S::Confirmed, E::MarkNoShow) => Ok(S::NoShow),
            (from, event) => Err(TransitionError { from, event }),
        }
    }

    /// Statuses that keep the booked slots unavailable to others.
    pub fn holds_slots(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn slot_holding() -> [BookingStatus; 2] {
        [BookingStatus::Pending, BookingStatus::Confirmed]
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingEvent::PaymentConfirmed => "confirm payment",
            BookingEvent::PaymentRejected => "reject payment",
            BookingEvent::RequestRefund => "cancel",
            BookingEvent::ApproveRefund => "approve refund",
            BookingEvent::DenyRefund => "deny refund",
            BookingEvent::MarkCompleted => "mark completed",
            BookingEvent::MarkNoShow => "mark no-show",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Razorpay checkout, verified by signature.
    Online,
    CashAtTurf,
    /// Screenshot of a transfer to the owner's QR, verified by the owner.
    TierScreenshot,
    /// Screenshot of a transfer to the platform's QR, verified by an admin.
    PlatformQr,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::CashAtTurf => "cash_at_turf",
            PaymentMethod::TierScreenshot => "tier_screenshot",
            PaymentMethod::PlatformQr => "platform_qr",
        }
    }

    /// Whether the money reaches the platform first and must be paid out.
    pub fn collected_by_platform(&self) -> bool {
        matches!(self, PaymentMethod::Online | PaymentMethod::PlatformQr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PendingCash,
    PendingVerification,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PendingCash => "pending_cash",
            PaymentStatus::PendingVerification => "pending_verification",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDetails {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub player_count: Option<u32>,
}

/// Amounts in paise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub slot_rate: i64,
    pub slot_count: u32,
    pub base_price: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
    pub total_amount: i64,
    pub plan: PaymentPlan,
    pub commission_bps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub paid_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierPayment {
    pub screenshot_url: String,
    pub uploaded_at: DateTime,
    pub verification_status: VerificationStatus,
    pub rejection_reason: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformProof {
    pub screenshot_url: String,
    pub payment_reference: String,
    pub submitted_at: DateTime,
    pub rejection_reason: Option<String>,
    pub transaction_id: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_by: String,
    pub reason: String,
    pub cancelled_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayRefundStatus {
    NotApplicable,
    Processed,
    Failed,
}

/// Outcome of the gateway reversal attempted when an owner approves a refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub status: GatewayRefundStatus,
    pub refund_id: Option<String>,
    pub error: Option<String>,
    pub attempted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub amount: i64,
    pub reason: String,
    pub qr_image_url: String,
    pub requested_at: DateTime,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime>,
    pub note: Option<String>,
    pub gateway_refund: Option<GatewayRefund>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub turf_id: String,
    pub owner_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    /// Ordered by start time; never empty.
    pub time_slots: Vec<TimeSlot>,
    pub sport: String,
    pub player_details: PlayerDetails,
    pub notes: Option<String>,
    pub pricing: PriceBreakdown,
    pub payment: PaymentInfo,
    pub tier_payment: Option<TierPayment>,
    pub platform_proof: Option<PlatformProof>,
    pub cancellation: Option<CancellationRecord>,
    pub refund_request: Option<RefundRequest>,
    pub status: BookingStatus,
    pub payout_status: PayoutStatus,
    pub payout_reference: Option<String>,
    pub payout_note: Option<String>,
    pub paid_out_at: Option<DateTime>,
    pub paid_out_by: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Everything needed to create a booking; status and payment follow from `method`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub turf_id: String,
    pub owner_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
    pub sport: String,
    pub player_details: PlayerDetails,
    pub notes: Option<String>,
    pub pricing: PriceBreakdown,
    pub method: PaymentMethod,
}

impl Booking {
    pub fn new(input: NewBooking) -> Self {
        let now = DateTime::now();
        let (status, payment_status) = match input.method {
            PaymentMethod::CashAtTurf => (BookingStatus::Confirmed, PaymentStatus::PendingCash),
            _ => (BookingStatus::Pending, PaymentStatus::Pending),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            turf_id: input.turf_id,
            owner_id: input.owner_id,
            user_id: input.user_id,
            date: input.date,
            time_slots: input.time_slots,
            sport: input.sport,
            player_details: input.player_details,
            notes: input.notes,
            pricing: input.pricing,
            payment: PaymentInfo {
                method: input.method,
                status: payment_status,
                razorpay_order_id: None,
                razorpay_payment_id: None,
                paid_at: None,
            },
            tier_payment: None,
            platform_proof: None,
            cancellation: None,
            refund_request: None,
            status,
            payout_status: PayoutStatus::Pending,
            payout_reference: None,
            payout_note: None,
            paid_out_at: None,
            paid_out_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn first_slot(&self) -> Option<&TimeSlot> {
        self.time_slots.first()
    }

    /// The single-slot view older clients expect: first start to last end.
    pub fn legacy_slot(&self) -> Option<TimeSlot> {
        match (self.time_slots.first(), self.time_slots.last()) {
            (Some(first), Some(last)) => Some(TimeSlot {
                start_time: first.start_time.clone(),
                end_time: last.end_time.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_payout_eligible(&self) -> bool {
        self.payment.status == PaymentStatus::Completed
            && self.payment.method.collected_by_platform()
            && matches!(
                self.status,
                BookingStatus::Confirmed | BookingStatus::Completed | BookingStatus::NoShow
            )
    }
}
