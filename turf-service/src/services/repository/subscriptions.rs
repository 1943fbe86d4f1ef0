use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use service_core::error::AppError;
use tracing::instrument;

use super::return_updated;
use crate::models::{Subscription, SubscriptionStatus};

#[derive(Clone)]
pub struct SubscriptionRepository {
    collection: Collection<Subscription>,
}

impl SubscriptionRepository {
    pub fn new(collection: Collection<Subscription>) -> Self {
        Self { collection }
    }

    #[instrument(skip(self, subscription), fields(subscription_id = %subscription.id))]
    pub async fn insert(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.collection.insert_one(subscription, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Subscription>, AppError> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        Ok(self
            .collection
            .find(doc! { "owner_id": owner_id }, options)
            .await?
            .try_collect()
            .await?)
    }

    /// A pending subscription, or an active one that has not reached its end date.
    pub async fn find_open_for_owner(&self, owner_id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(self
            .collection
            .find_one(
                doc! {
                    "owner_id": owner_id,
                    "$or": [
                        { "status": SubscriptionStatus::Pending.as_str() },
                        {
                            "status": SubscriptionStatus::Active.as_str(),
                            "end_date": { "$gt": DateTime::now() },
                        },
                    ],
                },
                None,
            )
            .await?)
    }

    pub async fn find_current_for_owner(&self, owner_id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(self
            .collection
            .find_one(
                doc! {
                    "owner_id": owner_id,
                    "status": SubscriptionStatus::Active.as_str(),
                    "end_date": { "$gt": DateTime::now() },
                },
                None,
            )
            .await?)
    }

    /// Sets `to` (plus `set`) when the subscription is currently in one of `from`.
    #[instrument(skip(self, set))]
    pub async fn transition(
        &self,
        id: &str,
        from: &[SubscriptionStatus],
        to: SubscriptionStatus,
        mut set: Document,
    ) -> Result<Option<Subscription>, AppError> {
        let from: Vec<&str> = from.iter().map(SubscriptionStatus::as_str).collect();
        set.insert("status", to.as_str());
        set.insert("updated_at", DateTime::now());
        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "status": { "$in": from } },
                doc! { "$set": set },
                return_updated(),
            )
            .await?)
    }
}
