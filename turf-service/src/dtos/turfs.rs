use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::timestamp;
use crate::models::turf::SLOT_DURATIONS;
use crate::models::{Address, DayHours, GeoPoint, PaymentPlan, Turf, TurfStatus, WeeklyHours};
use crate::services::pricing::MAX_SLOT_RATE;
use crate::services::slots::{parse_hhmm, SlotAvailability};

fn validate_slot_duration(minutes: u32) -> Result<(), ValidationError> {
    if SLOT_DURATIONS.contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::new("slot_duration")
            .with_message("slotDuration must be 30, 60, 90 or 120".into()))
    }
}

fn validate_hours(hours: &WeeklyHoursDto) -> Result<(), ValidationError> {
    let valid = hours.days().all(|day| {
        !day.is_open
            || matches!(
                (parse_hhmm(&day.open), parse_hhmm(&day.close)),
                (Some(open), Some(close)) if close > open
            )
    });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("operating_hours")
            .with_message("Operating hours must be HH:MM with close after open".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayHoursDto {
    pub open: String,
    pub close: String,
    #[serde(default = "default_true")]
    pub is_open: bool,
}

fn default_true() -> bool {
    true
}

impl From<DayHoursDto> for DayHours {
    fn from(d: DayHoursDto) -> Self {
        Self {
            open: d.open,
            close: d.close,
            is_open: d.is_open,
        }
    }
}

impl From<&DayHours> for DayHoursDto {
    fn from(d: &DayHours) -> Self {
        Self {
            open: d.open.clone(),
            close: d.close.clone(),
            is_open: d.is_open,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyHoursDto {
    pub monday: Option<DayHoursDto>,
    pub tuesday: Option<DayHoursDto>,
    pub wednesday: Option<DayHoursDto>,
    pub thursday: Option<DayHoursDto>,
    pub friday: Option<DayHoursDto>,
    pub saturday: Option<DayHoursDto>,
    pub sunday: Option<DayHoursDto>,
}

impl WeeklyHoursDto {
    fn days(&self) -> impl Iterator<Item = &DayHoursDto> {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
        .into_iter()
        .flatten()
    }
}

impl From<WeeklyHoursDto> for WeeklyHours {
    fn from(w: WeeklyHoursDto) -> Self {
        Self {
            monday: w.monday.map(Into::into),
            tuesday: w.tuesday.map(Into::into),
            wednesday: w.wednesday.map(Into::into),
            thursday: w.thursday.map(Into::into),
            friday: w.friday.map(Into::into),
            saturday: w.saturday.map(Into::into),
            sunday: w.sunday.map(Into::into),
        }
    }
}

impl From<&WeeklyHours> for WeeklyHoursDto {
    fn from(w: &WeeklyHours) -> Self {
        Self {
            monday: w.monday.as_ref().map(Into::into),
            tuesday: w.tuesday.as_ref().map(Into::into),
            wednesday: w.wednesday.as_ref().map(Into::into),
            thursday: w.thursday.as_ref().map(Into::into),
            friday: w.friday.as_ref().map(Into::into),
            saturday: w.saturday.as_ref().map(Into::into),
            sunday: w.sunday.as_ref().map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    #[validate(length(min = 1, message = "address.line is required"))]
    pub line: String,
    #[validate(length(min = 1, message = "address.city is required"))]
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl From<AddressDto> for Address {
    fn from(a: AddressDto) -> Self {
        Self {
            line: a.line,
            city: a.city,
            state: a.state,
            pincode: a.pincode,
        }
    }
}

impl From<&Address> for AddressDto {
    fn from(a: &Address) -> Self {
        Self {
            line: a.line.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            pincode: a.pincode.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTurfRequest {
    #[validate(length(min = 2, max = 120, message = "name must be 2 to 120 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(nested)]
    pub address: AddressDto,
    pub location: Option<GeoPoint>,
    #[validate(length(min = 1, message = "At least one sport is required"))]
    pub sports: Vec<String>,
    #[validate(range(min = 1, max = MAX_SLOT_RATE, message = "weekdayRate must be between 1 paisa and ₹10,00,000"))]
    pub weekday_rate: i64,
    #[validate(range(min = 1, max = MAX_SLOT_RATE, message = "weekendRate must be between 1 paisa and ₹10,00,000"))]
    pub weekend_rate: i64,
    #[validate(custom(function = "validate_hours"))]
    pub operating_hours: WeeklyHoursDto,
    #[validate(custom(function = "validate_slot_duration"))]
    pub slot_duration: u32,
    #[serde(default = "default_plan")]
    pub payment_plan: PaymentPlan,
    #[validate(url(message = "ownerQrUrl must be a valid URL"))]
    pub owner_qr_url: Option<String>,
}

fn default_plan() -> PaymentPlan {
    PaymentPlan::Commission
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTurfRequest {
    #[validate(length(min = 2, max = 120, message = "name must be 2 to 120 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = MAX_SLOT_RATE, message = "weekdayRate must be between 1 paisa and ₹10,00,000"))]
    pub weekday_rate: Option<i64>,
    #[validate(range(min = 1, max = MAX_SLOT_RATE, message = "weekendRate must be between 1 paisa and ₹10,00,000"))]
    pub weekend_rate: Option<i64>,
    #[validate(custom(function = "validate_hours"))]
    pub operating_hours: Option<WeeklyHoursDto>,
    #[validate(length(min = 1, message = "At least one sport is required"))]
    pub sports: Option<Vec<String>>,
    pub is_active: Option<bool>,
    #[validate(url(message = "ownerQrUrl must be a valid URL"))]
    pub owner_qr_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurfDecision {
    Approved,
    Rejected,
    Suspended,
}

impl From<TurfDecision> for TurfStatus {
    fn from(d: TurfDecision) -> Self {
        match d {
            TurfDecision::Approved => TurfStatus::Approved,
            TurfDecision::Rejected => TurfStatus::Rejected,
            TurfDecision::Suspended => TurfStatus::Suspended,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTurfStatusRequest {
    pub status: TurfDecision,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurfListQuery {
    pub sport: Option<String>,
    pub city: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurfResponse {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: AddressDto,
    pub location: Option<GeoPoint>,
    pub sports: Vec<String>,
    pub weekday_rate: i64,
    pub weekend_rate: i64,
    pub operating_hours: WeeklyHoursDto,
    pub slot_duration: u32,
    pub status: TurfStatus,
    pub status_note: Option<String>,
    pub is_active: bool,
    pub payment_plan: PaymentPlan,
    pub owner_qr_url: Option<String>,
    pub total_bookings: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Turf> for TurfResponse {
    fn from(t: &Turf) -> Self {
        Self {
            id: t.id.clone(),
            owner_id: t.owner_id.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
            address: AddressDto::from(&t.address),
            location: t.location,
            sports: t.sports.clone(),
            weekday_rate: t.weekday_rate,
            weekend_rate: t.weekend_rate,
            operating_hours: WeeklyHoursDto::from(&t.operating_hours),
            slot_duration: t.slot_duration_minutes,
            status: t.status,
            status_note: t.status_note.clone(),
            is_active: t.is_active,
            payment_plan: t.payment_plan,
            owner_qr_url: t.owner_qr_url.clone(),
            total_bookings: t.total_bookings,
            created_at: timestamp(t.created_at),
            updated_at: timestamp(t.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailabilityDto {
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

impl From<SlotAvailability> for SlotAvailabilityDto {
    fn from(s: SlotAvailability) -> Self {
        Self {
            start_time: s.start_time,
            end_time: s.end_time,
            is_available: s.is_available,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub success: bool,
    pub turf_id: String,
    pub date: String,
    pub slot_duration: u32,
    pub slots: Vec<SlotAvailabilityDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(hours: WeeklyHoursDto, duration: u32) -> CreateTurfRequest {
        CreateTurfRequest {
            name: "Green Field".into(),
            description: None,
            address: AddressDto {
                line: "12 MG Road".into(),
                city: "Pune".into(),
                state: None,
                pincode: None,
            },
            location: None,
            sports: vec!["football".into()],
            weekday_rate: 100_000,
            weekend_rate: 150_000,
            operating_hours: hours,
            slot_duration: duration,
            payment_plan: PaymentPlan::Commission,
            owner_qr_url: None,
        }
    }

    fn open(open: &str, close: &str) -> Option<DayHoursDto> {
        Some(DayHoursDto {
            open: open.into(),
            close: close.into(),
            is_open: true,
        })
    }

    #[test]
    fn accepts_well_formed_turf() {
        let hours = WeeklyHoursDto {
            monday: open("06:00", "24:00"),
            ..Default::default()
        };
        assert!(request(hours, 60).validate().is_ok());
    }

    #[test]
    fn rejects_odd_durations_and_inverted_hours() {
        let hours = WeeklyHoursDto {
            monday: open("22:00", "06:00"),
            ..Default::default()
        };
        let errors = request(hours, 45).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("slot_duration"));
        assert!(fields.contains_key("operating_hours"));
    }

    #[test]
    fn rates_are_capped_per_slot() {
        let mut at_cap = request(WeeklyHoursDto::default(), 60);
        at_cap.weekday_rate = MAX_SLOT_RATE;
        at_cap.weekend_rate = MAX_SLOT_RATE;
        assert!(at_cap.validate().is_ok());

        let mut huge = request(WeeklyHoursDto::default(), 60);
        huge.weekday_rate = 10_000_000_000_000_000;
        let errors = huge.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("weekday_rate"));

        let update = UpdateTurfRequest {
            weekend_rate: Some(MAX_SLOT_RATE + 1),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("weekend_rate"));
    }

    #[test]
    fn closed_days_skip_time_checks() {
        let hours = WeeklyHoursDto {
            sunday: Some(DayHoursDto {
                open: "".into(),
                close: "".into(),
                is_open: false,
            }),
            ..Default::default()
        };
        assert!(request(hours, 30).validate().is_ok());
    }
}
