//! Currency arithmetic helpers.
//!
//! All monetary values are `rust_decimal::Decimal`. Intermediate results are
//! kept at full precision; rounding to the smallest currency unit happens
//! exactly once, at the end of a calculation.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary values round to 2 decimal places, half-up.
pub const DECIMAL_PLACES: u32 = 2;

/// Round a final amount to the smallest currency unit (half-up). The
/// result always carries two decimal places, so `5130` renders as
/// `5130.00` on the wire.
pub fn round_currency(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

/// Percentage of an amount, e.g. `percent_of(dec!(200), dec!(5))` is 10.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}
