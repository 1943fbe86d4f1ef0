mod bookings;
mod settings;
mod slot_locks;
mod subscriptions;
mod transactions;
mod turfs;

pub use bookings::{BookingFilter, BookingRepository};
pub use settings::SettingsRepository;
pub use slot_locks::SlotLockRepository;
pub use subscriptions::SubscriptionRepository;
pub use transactions::TransactionRepository;
pub use turfs::{TurfFilter, TurfRepository};

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

const DUPLICATE_KEY: i32 = 11000;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u64,
    pub page_size: u64,
}

impl Page {
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(20).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Capped at `i64::MAX`, the largest skip the server accepts.
    pub fn skip(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

pub(crate) fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

pub(crate) fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY))
            .unwrap_or(false),
        _ => false,
    }
}
