use chrono::{Datelike, NaiveDate, Weekday};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SLOT_DURATIONS: [u32; 4] = [30, 60, 90, 120];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurfStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl TurfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurfStatus::Pending => "pending",
            TurfStatus::Approved => "approved",
            TurfStatus::Rejected => "rejected",
            TurfStatus::Suspended => "suspended",
        }
    }
}

/// How the platform earns from a turf's bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlan {
    /// Platform takes a percentage of each booking.
    Commission,
    /// Owner pays a flat subscription and collects payments directly.
    Tier,
}

impl PaymentPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPlan::Commission => "commission",
            PaymentPlan::Tier => "tier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub monday: Option<DayHours>,
    pub tuesday: Option<DayHours>,
    pub wednesday: Option<DayHours>,
    pub thursday: Option<DayHours>,
    pub friday: Option<DayHours>,
    pub saturday: Option<DayHours>,
    pub sunday: Option<DayHours>,
}

impl WeeklyHours {
    /// Same hours every day of the week.
    pub fn every_day(open: &str, close: &str) -> Self {
        let day = Some(DayHours {
            open: open.to_string(),
            close: close.to_string(),
            is_open: true,
        });
        Self {
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day.clone(),
            saturday: day.clone(),
            sunday: day,
        }
    }

    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turf {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Address,
    pub location: Option<GeoPoint>,
    pub sports: Vec<String>,
    /// Paise per slot, Monday to Friday.
    pub weekday_rate: i64,
    /// Paise per slot, Saturday and Sunday.
    pub weekend_rate: i64,
    pub operating_hours: WeeklyHours,
    pub slot_duration_minutes: u32,
    pub status: TurfStatus,
    pub status_note: Option<String>,
    pub is_active: bool,
    pub payment_plan: PaymentPlan,
    pub owner_qr_url: Option<String>,
    pub total_bookings: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone)]
pub struct NewTurf {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Address,
    pub location: Option<GeoPoint>,
    pub sports: Vec<String>,
    pub weekday_rate: i64,
    pub weekend_rate: i64,
    pub operating_hours: WeeklyHours,
    pub slot_duration_minutes: u32,
    pub payment_plan: PaymentPlan,
    pub owner_qr_url: Option<String>,
}

impl Turf {
    pub fn new(input: NewTurf) -> Self {
        let now = DateTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: input.owner_id,
            name: input.name,
            description: input.description,
            address: input.address,
            location: input.location,
            sports: input.sports,
            weekday_rate: input.weekday_rate,
            weekend_rate: input.weekend_rate,
            operating_hours: input.operating_hours,
            slot_duration_minutes: input.slot_duration_minutes,
            status: TurfStatus::Pending,
            status_note: None,
            is_active: true,
            payment_plan: input.payment_plan,
            owner_qr_url: input.owner_qr_url,
            total_bookings: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_bookable(&self) -> bool {
        self.status == TurfStatus::Approved && self.is_active
    }

    /// Public visitors only see bookable turfs; the owner and admins see everything.
    pub fn visible_to(&self, viewer_id: Option<&str>, is_admin: bool) -> bool {
        self.is_bookable() || is_admin || viewer_id == Some(self.owner_id.as_str())
    }

    pub fn rate_for(&self, date: NaiveDate) -> i64 {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => self.weekend_rate,
            _ => self.weekday_rate,
        }
    }

    pub fn supports_sport(&self, sport: &str) -> bool {
        self.sports.iter().any(|s| s.eq_ignore_ascii_case(sport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turf() -> Turf {
        Turf::new(NewTurf {
            owner_id: "owner-1".into(),
            name: "Green Field".into(),
            description: None,
            address: Address {
                line: "12 MG Road".into(),
                city: "Pune".into(),
                state: None,
                pincode: None,
            },
            location: None,
            sports: vec!["football".into(), "cricket".into()],
            weekday_rate: 100_000,
            weekend_rate: 150_000,
            operating_hours: WeeklyHours::every_day("06:00", "23:00"),
            slot_duration_minutes: 60,
            payment_plan: PaymentPlan::Commission,
            owner_qr_url: None,
        })
    }

    #[test]
    fn weekend_rate_applies_on_saturday_and_sunday() {
        let t = turf();
        let friday = NaiveDate::from_ymd_opt(2025, 6, 13).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        assert_eq!(t.rate_for(friday), 100_000);
        assert_eq!(t.rate_for(saturday), 150_000);
        assert_eq!(t.rate_for(sunday), 150_000);
    }

    #[test]
    fn new_turfs_wait_for_approval() {
        let mut t = turf();
        assert!(!t.is_bookable());
        assert!(!t.visible_to(Some("someone-else"), false));
        assert!(t.visible_to(Some("owner-1"), false));
        assert!(t.visible_to(None, true));

        t.status = TurfStatus::Approved;
        assert!(t.visible_to(None, false));

        t.is_active = false;
        assert!(!t.is_bookable());
    }

    #[test]
    fn sport_match_ignores_case() {
        let t = turf();
        assert!(t.supports_sport("Football"));
        assert!(!t.supports_sport("tennis"));
    }
}
