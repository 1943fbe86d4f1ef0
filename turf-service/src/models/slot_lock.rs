use chrono::NaiveDate;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// One reserved `(turf, date, start)` triple. The `_id` is the triple itself, so
/// the primary key index is what rejects a second reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotLock {
    #[serde(rename = "_id")]
    pub id: String,
    pub booking_id: String,
    pub turf_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub created_at: DateTime,
}

impl SlotLock {
    pub fn key(turf_id: &str, date: NaiveDate, start_time: &str) -> String {
        format!("{}:{}:{}", turf_id, date.format("%Y-%m-%d"), start_time)
    }

    pub fn new(booking_id: &str, turf_id: &str, date: NaiveDate, start_time: &str) -> Self {
        Self {
            id: Self::key(turf_id, date, start_time),
            booking_id: booking_id.to_string(),
            turf_id: turf_id.to_string(),
            date,
            start_time: start_time.to_string(),
            created_at: DateTime::now(),
        }
    }
}
