use std::collections::{BTreeMap, HashMap};

use crate::models::Booking;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutLine {
    pub booking_id: String,
    pub turf_id: String,
    pub turf_name: Option<String>,
    pub date: String,
    pub total_amount: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
    pub payment_method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerPayout {
    pub owner_id: String,
    pub total_revenue: i64,
    pub platform_fee: i64,
    pub owner_earnings: i64,
    pub booking_count: usize,
    pub bookings: Vec<PayoutLine>,
}

/// Groups unpaid bookings by owner, largest amount owed first.
pub fn group_by_owner(bookings: &[Booking], turf_names: &HashMap<String, String>) -> Vec<OwnerPayout> {
    let mut by_owner: BTreeMap<&str, OwnerPayout> = BTreeMap::new();

    for booking in bookings {
        let entry = by_owner
            .entry(booking.owner_id.as_str())
            .or_insert_with(|| OwnerPayout {
                owner_id: booking.owner_id.clone(),
                total_revenue: 0,
                platform_fee: 0,
                owner_earnings: 0,
                booking_count: 0,
                bookings: Vec::new(),
            });

        entry.total_revenue += booking.pricing.total_amount;
        entry.platform_fee += booking.pricing.platform_fee;
        entry.owner_earnings += booking.pricing.owner_earnings;
        entry.booking_count += 1;
        entry.bookings.push(PayoutLine {
            booking_id: booking.id.clone(),
            turf_id: booking.turf_id.clone(),
            turf_name: turf_names.get(&booking.turf_id).cloned(),
            date: booking.date.format("%Y-%m-%d").to_string(),
            total_amount: booking.pricing.total_amount,
            platform_fee: booking.pricing.platform_fee,
            owner_earnings: booking.pricing.owner_earnings,
            payment_method: booking.payment.method.as_str(),
        });
    }

    let mut owners: Vec<OwnerPayout> = by_owner.into_values().collect();
    // stable sort keeps owner id order among equal amounts
    owners.sort_by(|a, b| b.owner_earnings.cmp(&a.owner_earnings));
    owners
}
