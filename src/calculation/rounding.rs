//! Money rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a money amount to cents, half away from zero.
///
/// Applied only when an amount is stored on a pay record; intermediate
/// values keep full precision.
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(10005, 3)), Decimal::new(1001, 2));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates a money amount to whole cents, toward zero.
///
/// Used for ceilings such as caps, which a rounded amount must never exceed.
pub fn truncate_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}
