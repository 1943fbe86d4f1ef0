use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{opt_timestamp, timestamp};
use crate::models::{Subscription, SubscriptionPlan, SubscriptionStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub plan: SubscriptionPlan,
    #[validate(url(message = "screenshotUrl must be a valid URL"))]
    pub screenshot_url: String,
    #[validate(length(min = 4, max = 64, message = "paymentReference must be 4 to 64 characters"))]
    pub payment_reference: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub owner_id: String,
    pub plan: SubscriptionPlan,
    pub amount: i64,
    pub max_turfs: u32,
    pub features: Vec<String>,
    pub screenshot_url: String,
    pub payment_reference: String,
    pub status: SubscriptionStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub rejection_reason: Option<String>,
    pub verified_by: Option<String>,
    pub created_at: String,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(s: &Subscription) -> Self {
        Self {
            id: s.id.clone(),
            owner_id: s.owner_id.clone(),
            plan: s.plan,
            amount: s.amount,
            max_turfs: s.max_turfs,
            features: s.features.clone(),
            screenshot_url: s.screenshot_url.clone(),
            payment_reference: s.payment_reference.clone(),
            status: s.status,
            start_date: opt_timestamp(s.start_date),
            end_date: opt_timestamp(s.end_date),
            rejection_reason: s.rejection_reason.clone(),
            verified_by: s.verified_by.clone(),
            created_at: timestamp(s.created_at),
        }
    }
}
