pub mod booking;
pub mod settings;
pub mod slot_lock;
pub mod subscription;
pub mod transaction;
pub mod turf;

pub use booking::{
    Booking, BookingEvent, BookingStatus, CancellationRecord, GatewayRefund, GatewayRefundStatus,
    NewBooking, PaymentInfo, PaymentMethod, PaymentStatus, PayoutStatus, PlatformProof,
    PlayerDetails, PriceBreakdown, RefundRequest, TierPayment, TimeSlot, TransitionError,
    VerificationStatus,
};
pub use settings::{BankDetails, PlatformSettings};
pub use slot_lock::SlotLock;
pub use subscription::{PlanDetails, Subscription, SubscriptionPlan, SubscriptionStatus};
pub use transaction::{Transaction, TransactionPayout, TransactionPayoutStatus};
pub use turf::{Address, DayHours, GeoPoint, NewTurf, PaymentPlan, Turf, TurfStatus, WeeklyHours};
