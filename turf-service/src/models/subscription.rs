use chrono::{Duration, Utc};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Basic,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    pub plan: SubscriptionPlan,
    pub name: &'static str,
    pub duration_days: i64,
    pub max_turfs: u32,
    /// Paise.
    pub price: i64,
    pub features: &'static [&'static str],
}

const PLANS: [PlanDetails; 3] = [
    PlanDetails {
        plan: SubscriptionPlan::Basic,
        name: "Basic",
        duration_days: 30,
        max_turfs: 1,
        price: 99_900,
        features: &["Direct payments to your QR", "Booking management"],
    },
    PlanDetails {
        plan: SubscriptionPlan::Pro,
        name: "Pro",
        duration_days: 30,
        max_turfs: 3,
        price: 249_900,
        features: &[
            "Direct payments to your QR",
            "Booking management",
            "Priority listing",
        ],
    },
    PlanDetails {
        plan: SubscriptionPlan::Enterprise,
        name: "Enterprise",
        duration_days: 30,
        max_turfs: 10,
        price: 499_900,
        features: &[
            "Direct payments to your QR",
            "Booking management",
            "Priority listing",
            "Dedicated support",
        ],
    },
];

impl SubscriptionPlan {
    pub fn catalogue() -> &'static [PlanDetails] {
        &PLANS
    }

    pub fn details(&self) -> &'static PlanDetails {
        match self {
            SubscriptionPlan::Basic => &PLANS[0],
            SubscriptionPlan::Pro => &PLANS[1],
            SubscriptionPlan::Enterprise => &PLANS[2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Rejected,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Rejected => "rejected",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub plan: SubscriptionPlan,
    pub amount: i64,
    pub max_turfs: u32,
    pub features: Vec<String>,
    pub screenshot_url: String,
    pub payment_reference: String,
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
    pub rejection_reason: Option<String>,
    pub verified_by: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Subscription {
    pub fn new(
        owner_id: &str,
        plan: SubscriptionPlan,
        screenshot_url: &str,
        payment_reference: &str,
    ) -> Self {
        let details = plan.details();
        let now = DateTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            plan,
            amount: details.price,
            max_turfs: details.max_turfs,
            features: details.features.iter().map(|f| f.to_string()).collect(),
            screenshot_url: screenshot_url.to_string(),
            payment_reference: payment_reference.to_string(),
            status: SubscriptionStatus::Pending,
            start_date: None,
            end_date: None,
            rejection_reason: None,
            verified_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Start and end of a subscription activated at `now`.
    pub fn activation_window(&self, now: chrono::DateTime<Utc>) -> (DateTime, DateTime) {
        let end = now + Duration::days(self.plan.details().duration_days);
        (DateTime::from_chrono(now), DateTime::from_chrono(end))
    }

    pub fn has_lapsed(&self, now: DateTime) -> bool {
        self.status == SubscriptionStatus::Active
            && self.end_date.map(|end| end <= now).unwrap_or(false)
    }

    pub fn is_current(&self, now: DateTime) -> bool {
        self.status == SubscriptionStatus::Active && !self.has_lapsed(now)
    }
}
