use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{opt_timestamp, timestamp};
use crate::models::{
    Booking, BookingStatus, CancellationRecord, GatewayRefund, GatewayRefundStatus, PaymentInfo,
    PaymentMethod, PaymentStatus, PayoutStatus, PlatformProof, PlayerDetails, PriceBreakdown,
    RefundRequest, TierPayment, TimeSlot, VerificationStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl From<&TimeSlot> for SlotDto {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetailsDto {
    #[validate(length(min = 1, message = "Player name is required"))]
    pub name: String,
    #[validate(length(min = 7, max = 15, message = "Player phone must be 7 to 15 characters"))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(range(min = 1, max = 50, message = "Player count must be between 1 and 50"))]
    pub player_count: Option<u32>,
}

impl From<PlayerDetailsDto> for PlayerDetails {
    fn from(dto: PlayerDetailsDto) -> Self {
        Self {
            name: dto.name,
            phone: dto.phone,
            email: dto.email,
            player_count: dto.player_count,
        }
    }
}

impl From<&PlayerDetails> for PlayerDetailsDto {
    fn from(p: &PlayerDetails) -> Self {
        Self {
            name: p.name.clone(),
            phone: p.phone.clone(),
            email: p.email.clone(),
            player_count: p.player_count,
        }
    }
}

/// Payment choices a customer can make. Tier turfs override everything except cash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChoice {
    #[default]
    Online,
    CashAtTurf,
    PlatformQr,
}

/// Fields other than `turfId` default so the turf is checked before the payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub turf_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time_slots: Vec<SlotDto>,
    /// Single-slot form sent by older clients.
    pub time_slot: Option<SlotDto>,
    #[serde(default)]
    pub sport: String,
    pub player_details: Option<PlayerDetailsDto>,
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentChoice,
}

impl CreateBookingRequest {
    /// Requested start times, preferring the list form.
    pub fn requested_starts(&self) -> Vec<String> {
        if !self.time_slots.is_empty() {
            self.time_slots.iter().map(|s| s.start_time.clone()).collect()
        } else {
            self.time_slot
                .iter()
                .map(|s| s.start_time.clone())
                .collect()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerBookingQuery {
    pub turf_id: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub qr_image_url: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefundDecisionRequest {
    pub approve: bool,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    NoShow,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: OutcomeStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDto {
    pub slot_rate: i64,
    pub slot_count: u32,
    pub base_price: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
    pub total_amount: i64,
    pub commission_bps: u32,
}

impl From<&PriceBreakdown> for PricingDto {
    fn from(p: &PriceBreakdown) -> Self {
        Self {
            slot_rate: p.slot_rate,
            slot_count: p.slot_count,
            base_price: p.base_price,
            platform_fee: p.platform_fee,
            owner_earnings: p.owner_earnings,
            total_amount: p.total_amount,
            commission_bps: p.commission_bps,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub paid_at: Option<String>,
}

impl From<&PaymentInfo> for PaymentDto {
    fn from(p: &PaymentInfo) -> Self {
        Self {
            method: p.method,
            status: p.status,
            razorpay_order_id: p.razorpay_order_id.clone(),
            razorpay_payment_id: p.razorpay_payment_id.clone(),
            paid_at: opt_timestamp(p.paid_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPaymentDto {
    pub screenshot_url: String,
    pub uploaded_at: String,
    pub verification_status: VerificationStatus,
    pub rejection_reason: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<String>,
}

impl From<&TierPayment> for TierPaymentDto {
    fn from(t: &TierPayment) -> Self {
        Self {
            screenshot_url: t.screenshot_url.clone(),
            uploaded_at: timestamp(t.uploaded_at),
            verification_status: t.verification_status,
            rejection_reason: t.rejection_reason.clone(),
            verified_by: t.verified_by.clone(),
            verified_at: opt_timestamp(t.verified_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProofDto {
    pub screenshot_url: String,
    pub payment_reference: String,
    pub submitted_at: String,
    pub rejection_reason: Option<String>,
    pub transaction_id: Option<String>,
    pub reviewed_at: Option<String>,
}

impl From<&PlatformProof> for PlatformProofDto {
    fn from(p: &PlatformProof) -> Self {
        Self {
            screenshot_url: p.screenshot_url.clone(),
            payment_reference: p.payment_reference.clone(),
            submitted_at: timestamp(p.submitted_at),
            rejection_reason: p.rejection_reason.clone(),
            transaction_id: p.transaction_id.clone(),
            reviewed_at: opt_timestamp(p.reviewed_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationDto {
    pub cancelled_by: String,
    pub reason: String,
    pub cancelled_at: String,
}

impl From<&CancellationRecord> for CancellationDto {
    fn from(c: &CancellationRecord) -> Self {
        Self {
            cancelled_by: c.cancelled_by.clone(),
            reason: c.reason.clone(),
            cancelled_at: timestamp(c.cancelled_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRefundDto {
    pub status: GatewayRefundStatus,
    pub refund_id: Option<String>,
    pub error: Option<String>,
}

impl From<&GatewayRefund> for GatewayRefundDto {
    fn from(g: &GatewayRefund) -> Self {
        Self {
            status: g.status,
            refund_id: g.refund_id.clone(),
            error: g.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequestDto {
    pub amount: i64,
    pub reason: String,
    pub qr_image_url: String,
    pub requested_at: String,
    pub decided_by: Option<String>,
    pub decided_at: Option<String>,
    pub note: Option<String>,
    pub gateway_refund: Option<GatewayRefundDto>,
}

impl From<&RefundRequest> for RefundRequestDto {
    fn from(r: &RefundRequest) -> Self {
        Self {
            amount: r.amount,
            reason: r.reason.clone(),
            qr_image_url: r.qr_image_url.clone(),
            requested_at: timestamp(r.requested_at),
            decided_by: r.decided_by.clone(),
            decided_at: opt_timestamp(r.decided_at),
            note: r.note.clone(),
            gateway_refund: r.gateway_refund.as_ref().map(GatewayRefundDto::from),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub turf_id: String,
    pub user_id: String,
    pub owner_id: String,
    pub date: String,
    pub time_slots: Vec<SlotDto>,
    /// First start to last end, for clients that only understand one slot.
    pub time_slot: Option<SlotDto>,
    pub sport: String,
    pub player_details: PlayerDetailsDto,
    pub notes: Option<String>,
    pub pricing: PricingDto,
    pub payment: PaymentDto,
    pub tier_payment: Option<TierPaymentDto>,
    pub platform_proof: Option<PlatformProofDto>,
    pub cancellation: Option<CancellationDto>,
    pub refund_request: Option<RefundRequestDto>,
    pub status: BookingStatus,
    pub payout_status: PayoutStatus,
    pub payout_reference: Option<String>,
    pub paid_out_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Booking> for BookingResponse {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            turf_id: b.turf_id.clone(),
            user_id: b.user_id.clone(),
            owner_id: b.owner_id.clone(),
            date: b.date.format("%Y-%m-%d").to_string(),
            time_slots: b.time_slots.iter().map(SlotDto::from).collect(),
            time_slot: b.legacy_slot().as_ref().map(SlotDto::from),
            sport: b.sport.clone(),
            player_details: PlayerDetailsDto::from(&b.player_details),
            notes: b.notes.clone(),
            pricing: PricingDto::from(&b.pricing),
            payment: PaymentDto::from(&b.payment),
            tier_payment: b.tier_payment.as_ref().map(TierPaymentDto::from),
            platform_proof: b.platform_proof.as_ref().map(PlatformProofDto::from),
            cancellation: b.cancellation.as_ref().map(CancellationDto::from),
            refund_request: b.refund_request.as_ref().map(RefundRequestDto::from),
            status: b.status,
            payout_status: b.payout_status,
            payout_reference: b.payout_reference.clone(),
            paid_out_at: opt_timestamp(b.paid_out_at),
            created_at: timestamp(b.created_at),
            updated_at: timestamp(b.updated_at),
        }
    }
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse::from(&b)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayOrderDto {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQrDto {
    pub qr_url: Option<String>,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking: BookingResponse,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razorpay_order: Option<RazorpayOrderDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_qr: Option<OwnerQrDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_payment: Option<super::PlatformPaymentDto>,
}

#[derive(Debug, Serialize)]
pub struct BookingEnvelope {
    pub success: bool,
    pub message: String,
    pub booking: BookingResponse,
}

impl BookingEnvelope {
    pub fn new(message: impl Into<String>, booking: &Booking) -> Self {
        Self {
            success: true,
            message: message.into(),
            booking: booking.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundDecisionResponse {
    pub success: bool,
    pub message: String,
    pub booking: BookingResponse,
    /// Present on approval; a failed gateway reversal is reported here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_refund: Option<GatewayRefundDto>,
}
