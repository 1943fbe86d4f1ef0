use serde::{Deserialize, Serialize};
use validator::Validate;

use super::opt_timestamp;
use crate::models::{BankDetails, PlatformSettings};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BankDetailsDto {
    #[validate(length(min = 1, message = "accountName is required"))]
    pub account_name: String,
    #[validate(length(min = 6, max = 20, message = "accountNumber must be 6 to 20 characters"))]
    pub account_number: String,
    #[validate(length(equal = 11, message = "ifsc must be 11 characters"))]
    pub ifsc: String,
    pub bank_name: Option<String>,
}

impl From<&BankDetails> for BankDetailsDto {
    fn from(b: &BankDetails) -> Self {
        Self {
            account_name: b.account_name.clone(),
            account_number: b.account_number.clone(),
            ifsc: b.ifsc.clone(),
            bank_name: b.bank_name.clone(),
        }
    }
}

impl From<BankDetailsDto> for BankDetails {
    fn from(b: BankDetailsDto) -> Self {
        Self {
            account_name: b.account_name,
            account_number: b.account_number,
            ifsc: b.ifsc,
            bank_name: b.bank_name,
        }
    }
}

/// What a customer needs to pay the platform directly.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPaymentDto {
    pub upi_id: Option<String>,
    pub qr_image_url: Option<String>,
    pub bank_details: Option<BankDetailsDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

impl PlatformPaymentDto {
    pub fn from_settings(settings: &PlatformSettings, amount: Option<i64>) -> Self {
        Self {
            upi_id: settings.upi_id.clone(),
            qr_image_url: settings.qr_image_url.clone(),
            bank_details: settings.bank_details.as_ref().map(BankDetailsDto::from),
            amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub commission_bps: u32,
    pub cancellation_fee_bps: u32,
    pub upi_id: Option<String>,
    pub qr_image_url: Option<String>,
    pub bank_details: Option<BankDetailsDto>,
    pub updated_by: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&PlatformSettings> for SettingsResponse {
    fn from(s: &PlatformSettings) -> Self {
        Self {
            commission_bps: s.commission_bps,
            cancellation_fee_bps: s.cancellation_fee_bps,
            upi_id: s.upi_id.clone(),
            qr_image_url: s.qr_image_url.clone(),
            bank_details: s.bank_details.as_ref().map(BankDetailsDto::from),
            updated_by: s.updated_by.clone(),
            updated_at: opt_timestamp(s.updated_at),
        }
    }
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(range(max = 5000, message = "commissionBps must be at most 5000"))]
    pub commission_bps: Option<u32>,
    #[validate(range(max = 5000, message = "cancellationFeeBps must be at most 5000"))]
    pub cancellation_fee_bps: Option<u32>,
    pub upi_id: Option<String>,
    #[validate(url(message = "qrImageUrl must be a valid URL"))]
    pub qr_image_url: Option<String>,
    #[validate(nested)]
    pub bank_details: Option<BankDetailsDto>,
}
