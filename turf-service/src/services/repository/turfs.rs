use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::instrument;

use super::{return_updated, Page};
use crate::models::{PaymentPlan, Turf, TurfStatus};

#[derive(Debug, Default, Clone)]
pub struct TurfFilter {
    pub sport: Option<String>,
    pub city: Option<String>,
}

#[derive(Clone)]
pub struct TurfRepository {
    collection: Collection<Turf>,
}

impl TurfRepository {
    pub fn new(collection: Collection<Turf>) -> Self {
        Self { collection }
    }

    #[instrument(skip(self, turf), fields(turf_id = %turf.id))]
    pub async fn insert(&self, turf: &Turf) -> Result<(), AppError> {
        self.collection.insert_one(turf, None).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Turf>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    /// Approved, active turfs, optionally narrowed by sport and city.
    #[instrument(skip(self))]
    pub async fn list_public(&self, filter: &TurfFilter, page: Page) -> Result<(Vec<Turf>, u64), AppError> {
        let mut query = doc! {
            "status": TurfStatus::Approved.as_str(),
            "is_active": true,
        };
        if let Some(sport) = &filter.sport {
            query.insert(
                "sports",
                doc! { "$regex": format!("^{}$", escape_regex(sport)), "$options": "i" },
            );
        }
        if let Some(city) = &filter.city {
            query.insert(
                "address.city",
                doc! { "$regex": format!("^{}$", escape_regex(city)), "$options": "i" },
            );
        }

        let total = self.collection.count_documents(query.clone(), None).await?;
        let options = FindOptions::builder()
            .sort(doc! { "total_bookings": -1, "created_at": -1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();
        let turfs = self.collection.find(query, options).await?.try_collect().await?;
        Ok((turfs, total))
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Turf>, AppError> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let turfs = self
            .collection
            .find(doc! { "owner_id": owner_id }, options)
            .await?
            .try_collect()
            .await?;
        Ok(turfs)
    }

    /// Turf names keyed by id, for labelling rows that only carry a turf id.
    pub async fn names_by_ids(&self, ids: &[String]) -> Result<HashMap<String, String>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let turfs: Vec<Turf> = self
            .collection
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?
            .try_collect()
            .await?;
        Ok(turfs.into_iter().map(|t| (t.id, t.name)).collect())
    }

    pub async fn count_tier_turfs(&self, owner_id: &str) -> Result<u64, AppError> {
        Ok(self
            .collection
            .count_documents(
                doc! { "owner_id": owner_id, "payment_plan": PaymentPlan::Tier.as_str() },
                None,
            )
            .await?)
    }

    /// Applies `$set` fields and returns the updated turf.
    #[instrument(skip(self, set))]
    pub async fn update(&self, id: &str, mut set: Document) -> Result<Option<Turf>, AppError> {
        set.insert("updated_at", DateTime::now());
        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, return_updated())
            .await?)
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: TurfStatus,
        note: Option<&str>,
    ) -> Result<Option<Turf>, AppError> {
        self.update(id, doc! { "status": status.as_str(), "status_note": note })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }

    pub async fn increment_bookings(&self, id: &str) -> Result<(), AppError> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "total_bookings": 1_i64 } },
                None,
            )
            .await?;
        Ok(())
    }
}

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
