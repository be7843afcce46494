//! Pricing

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::cart::CartLineItem;

/// Sum of unit price times quantity over all items
pub fn total_price(items: &[CartLineItem]) -> Decimal {
    items
        .iter()
        .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total()))
}

/// Sum of quantities over all items
pub fn item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Converts a major-unit amount into minor units (e.g. dollars to cents)
///
/// Returns `None` if the amount does not fit in an `i64` once scaled.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
}
