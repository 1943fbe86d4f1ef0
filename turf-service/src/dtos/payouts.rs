use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::payouts::{OwnerPayout, PayoutLine};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkPayoutRequest {
    #[validate(length(min = 1, max = 128, message = "reference is required"))]
    pub reference: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutHistoryQuery {
    pub owner_id: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutLineDto {
    pub booking_id: String,
    pub turf_id: String,
    pub turf_name: Option<String>,
    pub date: String,
    pub total_amount: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
    pub payment_method: &'static str,
}

impl From<PayoutLine> for PayoutLineDto {
    fn from(line: PayoutLine) -> Self {
        Self {
            booking_id: line.booking_id,
            turf_id: line.turf_id,
            turf_name: line.turf_name,
            date: line.date,
            total_amount: line.total_amount,
            platform_fee: line.platform_fee,
            owner_earnings: line.owner_earnings,
            payment_method: line.payment_method,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPayoutDto {
    pub owner_id: String,
    pub total_revenue: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
    pub booking_count: usize,
    pub bookings: Vec<PayoutLineDto>,
}

impl From<OwnerPayout> for OwnerPayoutDto {
    fn from(o: OwnerPayout) -> Self {
        Self {
            owner_id: o.owner_id,
            total_revenue: o.total_revenue,
            platform_fee: o.platform_fee,
            owner_earnings: o.owner_earnings,
            booking_count: o.booking_count,
            bookings: o.bookings.into_iter().map(PayoutLineDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayoutsResponse {
    pub success: bool,
    pub owners: Vec<OwnerPayoutDto>,
    pub total_owner_earnings: i64,
    pub total_bookings: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPayoutResponse {
    pub success: bool,
    pub owner_id: String,
    pub count: u64,
    pub total_earnings: i64,
}
