use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;
use mongodb::Collection;
use service_core::error::AppError;
use tracing::instrument;

use super::{is_duplicate_key, return_updated, Page};
use crate::models::{Transaction, TransactionPayoutStatus};

#[derive(Clone)]
pub struct TransactionRepository {
    collection: Collection<Transaction>,
}

impl TransactionRepository {
    pub fn new(collection: Collection<Transaction>) -> Self {
        Self { collection }
    }

    /// One transaction per booking; a second insert for the same booking is a conflict.
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id, booking_id = %transaction.booking_id))]
    pub async fn insert(&self, transaction: &Transaction) -> Result<(), AppError> {
        match self.collection.insert_one(transaction, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::conflict(
                "A transaction already exists for this booking",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Undoes an insert whose booking write did not go through.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn find_by_booking(&self, booking_id: &str) -> Result<Option<Transaction>, AppError> {
        Ok(self
            .collection
            .find_one(doc! { "booking_id": booking_id }, None)
            .await?)
    }

    pub async fn list(
        &self,
        payout_status: Option<TransactionPayoutStatus>,
        page: Page,
    ) -> Result<(Vec<Transaction>, u64), AppError> {
        let query = match payout_status {
            Some(status) => doc! { "payout.status": status.as_str() },
            None => doc! {},
        };
        let total = self.collection.count_documents(query.clone(), None).await?;
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();
        let transactions = self.collection.find(query, options).await?.try_collect().await?;
        Ok((transactions, total))
    }

    /// Moves the payout sub-state, guarded on the state the caller validated against.
    #[instrument(skip(self, reference, note))]
    pub async fn update_payout(
        &self,
        id: &str,
        from: TransactionPayoutStatus,
        to: TransactionPayoutStatus,
        reference: Option<&str>,
        note: Option<&str>,
    ) -> Result<Option<Transaction>, AppError> {
        let mut set = doc! {
            "payout.status": to.as_str(),
            "payout.updated_at": DateTime::now(),
        };
        if let Some(reference) = reference {
            set.insert("payout.reference", reference);
        }
        if let Some(note) = note {
            set.insert("payout.note", note);
        }

        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "payout.status": from.as_str() },
                doc! { "$set": set },
                return_updated(),
            )
            .await?)
    }

    /// Completes the transaction of a booking paid out through the booking ledger.
    /// Returns false when the booking has no open transaction.
    #[instrument(skip(self, reference, note))]
    pub async fn complete_for_booking(
        &self,
        booking_id: &str,
        reference: &str,
        note: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut set = doc! {
            "payout.status": TransactionPayoutStatus::Completed.as_str(),
            "payout.reference": reference,
            "payout.updated_at": DateTime::now(),
        };
        if let Some(note) = note {
            set.insert("payout.note", note);
        }

        let result = self
            .collection
            .update_one(
                doc! {
                    "booking_id": booking_id,
                    "payout.status": { "$ne": TransactionPayoutStatus::Completed.as_str() },
                },
                doc! { "$set": set },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}
