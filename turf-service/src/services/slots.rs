//! Slot generation and availability.
//!
//! Times of day are `HH:MM` strings in venue local time. The venue clock converts
//! them to instants using the fixed UTC offset from configuration.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{DayHours, TimeSlot, Turf};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minimum notice before the first slot for a user to cancel.
pub const CANCELLATION_NOTICE_HOURS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("At least one time slot is required")]
    Empty,
    #[error("Booking date cannot be in the past")]
    DateInPast,
    #[error("Time slot {0} is not offered on this date")]
    NotOffered(String),
    #[error("Time slot {0} has already started")]
    InPast(String),
    #[error("Time slot {0} is requested more than once")]
    Duplicate(String),
    #[error("Invalid venue UTC offset: {0} minutes")]
    InvalidOffset(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAvailability {
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// Minutes since midnight. `24:00` is accepted as end of day.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;

    match (hours, minutes) {
        (24, 0) => Some(MINUTES_PER_DAY),
        (0..=23, 0..=59) => Some(hours * 60 + minutes),
        _ => None,
    }
}

pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Fixed-width windows from open to close. A window that would run past close is dropped.
pub fn generate(hours: Option<&DayHours>, duration_minutes: u32) -> Vec<TimeSlot> {
    let Some(hours) = hours.filter(|h| h.is_open) else {
        return Vec::new();
    };
    let (Some(open), Some(close)) = (parse_hhmm(&hours.open), parse_hhmm(&hours.close)) else {
        return Vec::new();
    };
    if duration_minutes == 0 || close <= open {
        return Vec::new();
    }

    (open..)
        .step_by(duration_minutes as usize)
        .take_while(|start| start + duration_minutes <= close)
        .map(|start| TimeSlot {
            start_time: format_hhmm(start),
            end_time: format_hhmm(start + duration_minutes),
        })
        .collect()
}

pub fn slots_for_date(turf: &Turf, date: NaiveDate) -> Vec<TimeSlot> {
    generate(
        turf.operating_hours.for_weekday(date.weekday()),
        turf.slot_duration_minutes,
    )
}

/// Wall-clock time at the venue.
#[derive(Debug, Clone, Copy)]
pub struct VenueClock {
    offset: FixedOffset,
}

impl VenueClock {
    pub fn new(utc_offset_minutes: i32) -> Result<Self, SlotError> {
        FixedOffset::east_opt(utc_offset_minutes * 60)
            .map(|offset| Self { offset })
            .ok_or(SlotError::InvalidOffset(utc_offset_minutes))
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// The instant a slot starting at `start_time` on `date` begins.
    pub fn slot_start(&self, date: NaiveDate, start_time: &str) -> Option<DateTime<Utc>> {
        let minutes = parse_hhmm(start_time)?;
        let midnight = self
            .offset
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .single()?;
        Some((midnight + Duration::minutes(i64::from(minutes))).with_timezone(&Utc))
    }

    pub fn has_started(&self, date: NaiveDate, start_time: &str, now: DateTime<Utc>) -> bool {
        self.slot_start(date, start_time)
            .map(|start| start <= now)
            .unwrap_or(true)
    }

    /// Whether a booking whose first slot is `start_time` on `date` can still be cancelled.
    pub fn allows_cancellation(&self, date: NaiveDate, start_time: &str, now: DateTime<Utc>) -> bool {
        self.slot_start(date, start_time)
            .map(|start| start - now >= Duration::hours(CANCELLATION_NOTICE_HOURS))
            .unwrap_or(false)
    }
}

/// Marks generated slots against the start times already held and the current time.
pub fn availability(
    generated: &[TimeSlot],
    taken_starts: &HashSet<String>,
    date: NaiveDate,
    clock: &VenueClock,
    now: DateTime<Utc>,
) -> Vec<SlotAvailability> {
    generated
        .iter()
        .map(|slot| SlotAvailability {
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            is_available: !taken_starts.contains(&slot.start_time)
                && !clock.has_started(date, &slot.start_time, now),
        })
        .collect()
}

/// Checks requested start times against what the turf offers on `date` and
/// returns the matching slots ordered by start time.
pub fn resolve_requested(
    turf: &Turf,
    date: NaiveDate,
    requested_starts: &[String],
    clock: &VenueClock,
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>, SlotError> {
    if requested_starts.is_empty() {
        return Err(SlotError::Empty);
    }
    if date < clock.today(now) {
        return Err(SlotError::DateInPast);
    }

    let offered = slots_for_date(turf, date);
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(requested_starts.len());

    for start in requested_starts {
        if !seen.insert(start.as_str()) {
            return Err(SlotError::Duplicate(start.clone()));
        }
        let slot = offered
            .iter()
            .find(|slot| &slot.start_time == start)
            .ok_or_else(|| SlotError::NotOffered(start.clone()))?;
        if clock.has_started(date, start, now) {
            return Err(SlotError::InPast(start.clone()));
        }
        resolved.push(slot.clone());
    }

    // HH:MM sorts lexically
    resolved.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    Ok(resolved)
}
