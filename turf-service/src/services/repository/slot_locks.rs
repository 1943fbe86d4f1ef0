use chrono::NaiveDate;
use mongodb::bson::doc;
use mongodb::options::InsertManyOptions;
use mongodb::Collection;
use service_core::error::AppError;
use tracing::instrument;

use super::is_duplicate_key;
use crate::models::{SlotLock, TimeSlot};

pub const SLOT_TAKEN_MESSAGE: &str = "One or more of the selected time slots is already booked";

#[derive(Clone)]
pub struct SlotLockRepository {
    collection: Collection<SlotLock>,
}

impl SlotLockRepository {
    pub fn new(collection: Collection<SlotLock>) -> Self {
        Self { collection }
    }

    /// Reserves every slot for `booking_id` or none of them.
    ///
    /// Locks are inserted in order; the first duplicate key stops the insert, and
    /// whatever this booking already locked is removed before returning.
    #[instrument(skip(self, slots), fields(slot_count = slots.len()))]
    pub async fn acquire(
        &self,
        booking_id: &str,
        turf_id: &str,
        date: NaiveDate,
        slots: &[TimeSlot],
    ) -> Result<(), AppError> {
        let locks: Vec<SlotLock> = slots
            .iter()
            .map(|slot| SlotLock::new(booking_id, turf_id, date, &slot.start_time))
            .collect();

        let options = InsertManyOptions::builder().ordered(true).build();
        match self.collection.insert_many(locks, options).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                tracing::info!(turf_id, %date, "Slot already reserved, rolling back partial locks");
                self.release(booking_id).await?;
                Err(AppError::bad_request(SLOT_TAKEN_MESSAGE))
            }
            Err(e) => {
                tracing::error!(turf_id, "Failed to reserve slots: {}", e);
                self.release(booking_id).await?;
                Err(AppError::from(e))
            }
        }
    }

    /// Frees the slots held by a booking. Releasing twice is harmless.
    #[instrument(skip(self))]
    pub async fn release(&self, booking_id: &str) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_many(doc! { "booking_id": booking_id }, None)
            .await?;
        tracing::debug!(released = result.deleted_count, "Released slot locks");
        Ok(result.deleted_count)
    }
}
