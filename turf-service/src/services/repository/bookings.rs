use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use service_core::error::AppError;
use std::collections::HashSet;
use tracing::instrument;

use super::{return_updated, Page};
use crate::models::{Booking, BookingStatus, PaymentMethod, PaymentStatus, PayoutStatus};

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn holding_statuses() -> Vec<&'static str> {
    BookingStatus::slot_holding()
        .iter()
        .map(BookingStatus::as_str)
        .collect()
}

/// Bookings whose money the platform holds and has not yet passed to the owner.
pub(crate) fn payout_eligible() -> Document {
    doc! {
        "payment.status": PaymentStatus::Completed.as_str(),
        "payout_status": PayoutStatus::Pending.as_str(),
        "payment.method": {
            "$in": [PaymentMethod::Online.as_str(), PaymentMethod::PlatformQr.as_str()]
        },
        "status": {
            "$in": [
                BookingStatus::Confirmed.as_str(),
                BookingStatus::Completed.as_str(),
                BookingStatus::NoShow.as_str(),
            ]
        },
    }
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub turf_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    fn apply(&self, query: &mut Document) {
        if let Some(turf_id) = &self.turf_id {
            query.insert("turf_id", turf_id.as_str());
        }
        if let Some(date) = self.date {
            query.insert("date", date_key(date));
        }
        if let Some(status) = self.status {
            query.insert("status", status.as_str());
        }
    }
}

#[derive(Clone)]
pub struct BookingRepository {
    collection: Collection<Booking>,
}

impl BookingRepository {
    pub fn new(collection: Collection<Booking>) -> Self {
        Self { collection }
    }

    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    pub async fn insert(&self, booking: &Booking) -> Result<(), AppError> {
        self.collection.insert_one(booking, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    /// Start times held by pending or confirmed bookings of a turf on a date.
    #[instrument(skip(self))]
    pub async fn held_starts(&self, turf_id: &str, date: NaiveDate) -> Result<HashSet<String>, AppError> {
        let bookings: Vec<Booking> = self
            .collection
            .find(
                doc! {
                    "turf_id": turf_id,
                    "date": date_key(date),
                    "status": { "$in": holding_statuses() },
                },
                None,
            )
            .await?
            .try_collect()
            .await?;

        Ok(bookings
            .into_iter()
            .flat_map(|b| b.time_slots.into_iter().map(|slot| slot.start_time))
            .collect())
    }

    pub async fn has_upcoming_holding(&self, turf_id: &str, today: NaiveDate) -> Result<bool, AppError> {
        let count = self
            .collection
            .count_documents(
                doc! {
                    "turf_id": turf_id,
                    "date": { "$gte": date_key(today) },
                    "status": { "$in": holding_statuses() },
                },
                None,
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, AppError> {
        let mut query = doc! { "user_id": user_id };
        if let Some(status) = status {
            query.insert("status", status.as_str());
        }
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        Ok(self.collection.find(query, options).await?.try_collect().await?)
    }

    pub async fn list_for_owner(
        &self,
        owner_id: &str,
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>, AppError> {
        let mut query = doc! { "owner_id": owner_id };
        filter.apply(&mut query);
        let options = FindOptions::builder()
            .sort(doc! { "date": -1, "created_at": -1 })
            .build();
        Ok(self.collection.find(query, options).await?.try_collect().await?)
    }

    /// Moves a booking from `from` to `to` and applies `set`, only if it is still in `from`.
    ///
    /// `None` means another request changed the booking first.
    #[instrument(skip(self, set), fields(from = %from, to = %to))]
    pub async fn transition(
        &self,
        id: &str,
        from: BookingStatus,
        to: BookingStatus,
        mut set: Document,
    ) -> Result<Option<Booking>, AppError> {
        set.insert("status", to.as_str());
        set.insert("updated_at", DateTime::now());
        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "status": from.as_str() },
                doc! { "$set": set },
                return_updated(),
            )
            .await?)
    }

    /// Applies `set` when the booking also matches `guard`. Status is left alone.
    #[instrument(skip(self, guard, set))]
    pub async fn update_guarded(
        &self,
        id: &str,
        mut guard: Document,
        mut set: Document,
    ) -> Result<Option<Booking>, AppError> {
        guard.insert("_id", id);
        set.insert("updated_at", DateTime::now());
        Ok(self
            .collection
            .find_one_and_update(guard, doc! { "$set": set }, return_updated())
            .await?)
    }

    pub async fn pending_payouts(&self) -> Result<Vec<Booking>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "owner_id": 1, "date": 1 })
            .build();
        Ok(self
            .collection
            .find(payout_eligible(), options)
            .await?
            .try_collect()
            .await?)
    }

    pub async fn pending_payouts_for_owner(&self, owner_id: &str) -> Result<Vec<Booking>, AppError> {
        let mut query = payout_eligible();
        query.insert("owner_id", owner_id);
        Ok(self.collection.find(query, None).await?.try_collect().await?)
    }

    /// Marks one eligible booking as paid out. `None` when it was not pending payout.
    #[instrument(skip(self, note))]
    pub async fn mark_paid(
        &self,
        id: &str,
        reference: &str,
        note: Option<&str>,
        paid_by: &str,
    ) -> Result<Option<Booking>, AppError> {
        let mut guard = payout_eligible();
        guard.insert("_id", id);
        Ok(self
            .collection
            .find_one_and_update(
                guard,
                doc! {
                    "$set": {
                        "payout_status": PayoutStatus::Paid.as_str(),
                        "payout_reference": reference,
                        "payout_note": note,
                        "paid_out_at": DateTime::now(),
                        "paid_out_by": paid_by,
                        "updated_at": DateTime::now(),
                    }
                },
                return_updated(),
            )
            .await?)
    }

    pub async fn payout_history(
        &self,
        owner_id: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Booking>, u64), AppError> {
        let mut query = doc! { "payout_status": PayoutStatus::Paid.as_str() };
        if let Some(owner_id) = owner_id {
            query.insert("owner_id", owner_id);
        }
        let total = self.collection.count_documents(query.clone(), None).await?;
        let options = FindOptions::builder()
            .sort(doc! { "paid_out_at": -1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();
        let bookings = self.collection.find(query, options).await?.try_collect().await?;
        Ok((bookings, total))
    }
}
