//! Money calculation utilities using rust_decimal for precision
//!
//! Monetary figures are stored and serialized as `f64`, but every
//! calculation runs through `Decimal` and is rounded to 2 decimal
//! places before converting back. This keeps derived rates and the
//! annual-billing arithmetic stable across repeated round trips.

use rust_decimal::prelude::*;

/// Rounding target for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Months per year times the 15% annual discount (12 * 0.85 = 10.2)
fn annual_factor() -> Decimal {
    Decimal::new(102, 1)
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round an f64 amount to 2 decimal places via Decimal
#[inline]
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Hourly rate = revenue / hours, 0 when hours is zero or unusable
pub fn rate(revenue: f64, hours: f64) -> f64 {
    let h = to_decimal(hours);
    if h <= Decimal::ZERO {
        return 0.0;
    }
    to_f64(to_decimal(revenue) / h)
}

/// part / whole * 100, 0 when the denominator is zero
pub fn percentage(part: f64, whole: f64) -> f64 {
    let w = to_decimal(whole);
    if w == Decimal::ZERO {
        return 0.0;
    }
    to_f64(to_decimal(part) / w * Decimal::ONE_HUNDRED)
}

/// Total charged for a year of service: 12x monthly minus 15%
pub fn annual_total(monthly: f64) -> f64 {
    to_f64(to_decimal(monthly) * annual_factor())
}

/// Reconstruct the canonical monthly price from an annual charge
pub fn monthly_from_annual(annual: f64) -> f64 {
    to_f64(to_decimal(annual) / annual_factor())
}

/// Major-unit amount to minor units (pence/cents) for the payment API
pub fn to_minor_units(amount: f64) -> i64 {
    (to_decimal(amount) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// Minor units back to a major-unit amount
pub fn from_minor_units(minor: i64) -> f64 {
    to_f64(Decimal::new(minor, 2))
}
