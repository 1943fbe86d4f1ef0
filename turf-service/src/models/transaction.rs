use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Booking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TransactionPayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionPayoutStatus::Pending => "pending",
            TransactionPayoutStatus::Processing => "processing",
            TransactionPayoutStatus::Completed => "completed",
            TransactionPayoutStatus::Failed => "failed",
        }
    }

    pub fn can_move_to(&self, next: TransactionPayoutStatus) -> bool {
        use TransactionPayoutStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Processing)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPayout {
    pub status: TransactionPayoutStatus,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub updated_at: Option<DateTime>,
}

/// Record of an admin-approved platform QR payment. Only `payout` changes after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
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
    pub verified_at: DateTime,
    pub payout: TransactionPayout,
    pub created_at: DateTime,
}

impl Transaction {
    /// Ledger entry for an approved proof. The split is the one priced into the booking.
    pub fn for_booking(
        booking: &Booking,
        payment_reference: &str,
        screenshot_url: &str,
        verified_by: &str,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            turf_id: booking.turf_id.clone(),
            owner_id: booking.owner_id.clone(),
            user_id: booking.user_id.clone(),
            amount: booking.pricing.total_amount,
            commission_bps: booking.pricing.commission_bps,
            platform_commission: booking.pricing.platform_fee,
            owner_amount: booking.pricing.owner_earnings,
            payment_reference: payment_reference.to_string(),
            screenshot_url: screenshot_url.to_string(),
            verified_by: verified_by.to_string(),
            verified_at: now,
            payout: TransactionPayout {
                status: TransactionPayoutStatus::Pending,
                reference: None,
                note: None,
                updated_at: None,
            },
            created_at: now,
        }
    }
}
