pub mod database;
pub mod jwt;
pub mod lifecycle;
pub mod metrics;
pub mod payouts;
pub mod pricing;
pub mod razorpay;
pub mod repository;
pub mod slots;

pub use database::MongoDb;
pub use jwt::{Claims, JwtService, Role};
pub use metrics::{get_metrics, init_metrics};
pub use razorpay::RazorpayClient;
pub use slots::VenueClock;
