use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use service_core::error::AppError;

use crate::services::repository::{
    BookingRepository, SettingsRepository, SlotLockRepository, SubscriptionRepository,
    TransactionRepository, TurfRepository,
};

pub const TURFS: &str = "turfs";
pub const BOOKINGS: &str = "bookings";
pub const SLOT_LOCKS: &str = "slot_locks";
pub const TRANSACTIONS: &str = "transactions";
pub const SUBSCRIPTIONS: &str = "subscriptions";
pub const SETTINGS: &str = "settings";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

fn index(keys: mongodb::bson::Document, name: &str, unique: bool) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(unique)
                .build(),
        )
        .build()
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for turf-service");

        self.raw::<mongodb::bson::Document>(BOOKINGS)
            .create_indexes(
                [
                    index(doc! { "turf_id": 1, "date": 1, "status": 1 }, "turf_date_status", false),
                    index(doc! { "user_id": 1, "created_at": -1 }, "user_recent", false),
                    index(doc! { "owner_id": 1, "status": 1 }, "owner_status", false),
                    index(
                        doc! { "payment.status": 1, "payout_status": 1 },
                        "payout_lookup",
                        false,
                    ),
                ],
                None,
            )
            .await?;
        tracing::info!("Created indexes on bookings");

        self.raw::<mongodb::bson::Document>(TURFS)
            .create_indexes(
                [
                    index(doc! { "owner_id": 1 }, "owner_lookup", false),
                    index(doc! { "status": 1, "is_active": 1 }, "listing", false),
                ],
                None,
            )
            .await?;
        tracing::info!("Created indexes on turfs");

        self.raw::<mongodb::bson::Document>(TRANSACTIONS)
            .create_indexes(
                [
                    index(doc! { "booking_id": 1 }, "booking_unique", true),
                    index(doc! { "payout.status": 1 }, "payout_status", false),
                ],
                None,
            )
            .await?;
        tracing::info!("Created indexes on transactions");

        self.raw::<mongodb::bson::Document>(SUBSCRIPTIONS)
            .create_index(index(doc! { "owner_id": 1, "status": 1 }, "owner_status", false), None)
            .await?;

        // The _id of a lock is the (turf, date, start) key; this one serves release by booking.
        self.raw::<mongodb::bson::Document>(SLOT_LOCKS)
            .create_index(index(doc! { "booking_id": 1 }, "booking_lookup", false), None)
            .await?;
        tracing::info!("Created indexes on subscriptions and slot_locks");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    fn raw<T>(&self, name: &str) -> Collection<T>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync,
    {
        self.db.collection(name)
    }

    pub fn turfs(&self) -> TurfRepository {
        TurfRepository::new(self.raw(TURFS))
    }

    pub fn bookings(&self) -> BookingRepository {
        BookingRepository::new(self.raw(BOOKINGS))
    }

    pub fn slot_locks(&self) -> SlotLockRepository {
        SlotLockRepository::new(self.raw(SLOT_LOCKS))
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.raw(TRANSACTIONS))
    }

    pub fn subscriptions(&self) -> SubscriptionRepository {
        SubscriptionRepository::new(self.raw(SUBSCRIPTIONS))
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.raw(SETTINGS))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
