use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::Collection;
use service_core::error::AppError;

use crate::models::settings::SETTINGS_ID;
use crate::models::PlatformSettings;

#[derive(Clone)]
pub struct SettingsRepository {
    collection: Collection<PlatformSettings>,
}

impl SettingsRepository {
    pub fn new(collection: Collection<PlatformSettings>) -> Self {
        Self { collection }
    }

    /// The stored settings, or defaults when none have been saved yet.
    pub async fn get(&self) -> Result<PlatformSettings, AppError> {
        Ok(self
            .collection
            .find_one(doc! { "_id": SETTINGS_ID }, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, settings: &PlatformSettings) -> Result<(), AppError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "_id": SETTINGS_ID }, settings, options)
            .await?;
        tracing::info!(
            commission_bps = settings.commission_bps,
            cancellation_fee_bps = settings.cancellation_fee_bps,
            "Platform settings saved"
        );
        Ok(())
    }
}
