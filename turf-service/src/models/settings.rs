use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const SETTINGS_ID: &str = "global";
pub const DEFAULT_COMMISSION_BPS: u32 = 1_000;
pub const DEFAULT_CANCELLATION_FEE_BPS: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub ifsc: String,
    pub bank_name: Option<String>,
}

/// Platform-wide singleton. Writes replace the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(rename = "_id")]
    pub id: String,
    pub commission_bps: u32,
    pub cancellation_fee_bps: u32,
    pub upi_id: Option<String>,
    pub qr_image_url: Option<String>,
    pub bank_details: Option<BankDetails>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            commission_bps: DEFAULT_COMMISSION_BPS,
            cancellation_fee_bps: DEFAULT_CANCELLATION_FEE_BPS,
            upi_id: None,
            qr_image_url: None,
            bank_details: None,
            updated_by: None,
            updated_at: None,
        }
    }
}
