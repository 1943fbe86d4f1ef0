pub mod bookings;
pub mod payments;
pub mod payouts;
pub mod settings;
pub mod subscriptions;
pub mod turfs;

use mongodb::bson::DateTime;
use serde::Serialize;

pub use bookings::*;
pub use payments::*;
pub use payouts::*;
pub use settings::*;
pub use subscriptions::*;
pub use turfs::*;

pub(crate) fn timestamp(dt: DateTime) -> String {
    dt.to_chrono().to_rfc3339()
}

pub(crate) fn opt_timestamp(dt: Option<DateTime>) -> Option<String> {
    dt.map(timestamp)
}

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
