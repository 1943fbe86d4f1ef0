//! Money arithmetic and the booking price breakdown.
//!
//! All amounts are `i64` paise and all rates are basis points (10_000 = 100%).
//! `percent_of` is the only place a fraction of an amount is computed.

use thiserror::Error;

use crate::models::{PaymentPlan, PriceBreakdown};

pub const BPS_SCALE: i64 = 10_000;

/// Highest accepted slot rate: ₹10,00,000 in paise.
pub const MAX_SLOT_RATE: i64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Booking amount is out of range")]
pub struct AmountOverflow;

/// `amount * bps / 10_000`, rounded half up to the nearest paisa.
pub fn percent_of(amount: i64, bps: u32) -> Result<i64, AmountOverflow> {
    let scaled = (i128::from(amount) * i128::from(bps) + i128::from(BPS_SCALE / 2))
        / i128::from(BPS_SCALE);
    i64::try_from(scaled).map_err(|_| AmountOverflow)
}

pub fn calculate(
    slot_rate: i64,
    slot_count: u32,
    plan: PaymentPlan,
    commission_bps: u32,
) -> Result<PriceBreakdown, AmountOverflow> {
    let base_price = slot_rate
        .checked_mul(i64::from(slot_count))
        .ok_or(AmountOverflow)?;

    let platform_fee = match plan {
        PaymentPlan::Tier => 0,
        PaymentPlan::Commission => percent_of(base_price, commission_bps)?,
    };

    Ok(PriceBreakdown {
        slot_rate,
        slot_count,
        base_price,
        platform_fee,
        owner_earnings: base_price.checked_sub(platform_fee).ok_or(AmountOverflow)?,
        // The customer pays the base price; commission comes out of the owner's share.
        total_amount: base_price,
        plan,
        commission_bps: match plan {
            PaymentPlan::Tier => 0,
            PaymentPlan::Commission => commission_bps,
        },
    })
}

/// Amount returned to a user who cancels. Tier owners refund in full; commission
/// turfs keep the cancellation fee.
pub fn refund_amount(
    total_amount: i64,
    plan: PaymentPlan,
    cancellation_fee_bps: u32,
) -> Result<i64, AmountOverflow> {
    match plan {
        PaymentPlan::Tier => Ok(total_amount),
        PaymentPlan::Commission => total_amount
            .checked_sub(percent_of(total_amount, cancellation_fee_bps)?)
            .ok_or(AmountOverflow),
    }
}
