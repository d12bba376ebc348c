//! Decimal scales, rounding and magnitude limits

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::domain::{DomainError, DomainResult};

/// Scale of per-unit rates and of intermediate rating arithmetic.
pub const RATE_SCALE: u32 = 4;

/// Scale of every amount that appears on a bill.
pub const MONEY_SCALE: u32 = 2;

/// Largest meter reading, register capacity or slab bound.
pub const MAX_UNITS: Decimal = dec!(1000000000000);

/// Largest per-unit rate.
pub const MAX_RATE: Decimal = dec!(1000000);

/// Largest charge, discount or balance (in absolute value) on one bill.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Round to bill precision, half away from zero.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to rate precision, half away from zero.
#[inline]
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Result of a `checked_*` operation; overflow is a `Validation` error.
pub fn checked(value: Option<Decimal>, what: &str) -> DomainResult<Decimal> {
    value.ok_or_else(|| DomainError::Validation(format!("{what} is out of range")))
}

/// `Validation` error unless `|value| <= max`.
pub fn ensure_within(value: Decimal, max: Decimal, what: &str) -> DomainResult<()> {
    if value.abs() > max {
        return Err(DomainError::Validation(format!(
            "{what} {value} exceeds the limit of {max}"
        )));
    }
    Ok(())
}

/// `amount × percentage / 100`, rounded to bill precision.
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> DomainResult<Decimal> {
    let product = checked(amount.checked_mul(percentage), "percentage amount")?;
    Ok(round_money(product / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rounds_half_up() {
        assert_eq!(round_money(dec!(10.945)), dec!(10.95));
        assert_eq!(round_money(dec!(10.944)), dec!(10.94));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn rate_rounds_to_four_places() {
        assert_eq!(round_rate(dec!(0.123449)), dec!(0.1234));
        assert_eq!(round_rate(dec!(0.12345)), dec!(0.1235));
    }

    #[test]
    fn percentage_of_amount() {
        assert_eq!(percentage_of(dec!(73.00), dec!(15)).unwrap(), dec!(10.95));
        assert_eq!(percentage_of(dec!(0), dec!(15)).unwrap(), dec!(0));
    }

    #[test]
    fn percentage_overflow_is_an_error() {
        assert!(matches!(
            percentage_of(Decimal::MAX, dec!(15)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn magnitude_limit_applies_to_both_signs() {
        assert!(ensure_within(dec!(-1000000), MAX_RATE, "credit").is_ok());
        assert!(ensure_within(dec!(1000000.01), MAX_RATE, "rate").is_err());
        assert!(ensure_within(dec!(-1000000000000.01), MAX_AMOUNT, "credit").is_err());
    }
}
