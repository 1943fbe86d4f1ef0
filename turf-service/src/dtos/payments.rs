use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{opt_timestamp, timestamp, BookingResponse};
use crate::models::{Transaction, TransactionPayoutStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "razorpayOrderId is required"))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1, message = "razorpayPaymentId is required"))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1, message = "razorpaySignature is required"))]
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadScreenshotRequest {
    #[validate(url(message = "screenshotUrl must be a valid URL"))]
    pub screenshot_url: String,
}

/// Review decision used by owner and admin verification paths.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecisionRequest {
    pub approve: bool,
    #[validate(length(max = 500, message = "Rejection reason must be at most 500 characters"))]
    pub rejection_reason: Option<String>,
}

impl ReviewDecisionRequest {
    /// The trimmed rejection reason, if one was given.
    pub fn reason(&self) -> Option<&str> {
        self.rejection_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofRequest {
    #[validate(url(message = "screenshotUrl must be a valid URL"))]
    pub screenshot_url: String,
    #[validate(length(min = 4, max = 64, message = "paymentReference must be 4 to 64 characters"))]
    pub payment_reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub payout_status: Option<TransactionPayoutStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionPayoutRequest {
    pub status: TransactionPayoutStatus,
    #[validate(length(min = 1, max = 128, message = "reference must be 1 to 128 characters"))]
    pub reference: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayoutDto {
    pub status: TransactionPayoutStatus,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub booking_id: String,
    pub turf_id: String,
    pub owner_id: String,
    pub user_id: String,
    pub amount: i64,
    pub commission_bps: u32,
    pub platform_commission: i64,
    pub owner_amount: i64,
    pub payment_reference: String,
    pub screenshot_url: String,
    pub verified_by: String,
    pub verified_at: String,
    pub payout: TransactionPayoutDto,
    pub created_at: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id.clone(),
            booking_id: t.booking_id.clone(),
            turf_id: t.turf_id.clone(),
            owner_id: t.owner_id.clone(),
            user_id: t.user_id.clone(),
            amount: t.amount,
            commission_bps: t.commission_bps,
            platform_commission: t.platform_commission,
            owner_amount: t.owner_amount,
            payment_reference: t.payment_reference.clone(),
            screenshot_url: t.screenshot_url.clone(),
            verified_by: t.verified_by.clone(),
            verified_at: timestamp(t.verified_at),
            payout: TransactionPayoutDto {
                status: t.payout.status,
                reference: t.payout.reference.clone(),
                note: t.payout.note.clone(),
                updated_at: opt_timestamp(t.payout.updated_at),
            },
            created_at: timestamp(t.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReviewResponse {
    pub success: bool,
    pub message: String,
    pub booking: BookingResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionResponse>,
}
