//! Shared numeric helpers for the tax and debt calculations.
//!
//! Calculations keep full `Decimal` precision internally; rounding to cents
//! happens only when a result is prepared for display.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative values to zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-5.00)), dec!(0));
/// assert_eq!(non_negative(dec!(5.00)), dec!(5.00));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Divides `part` by `whole`, returning zero when `whole` is not positive.
///
/// Used for effective rates, where a zero base means "no rate" rather than
/// an error.
pub fn ratio(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole > Decimal::ZERO {
        part / whole
    } else {
        Decimal::ZERO
    }
}

/// Returns true when `value` lies in the closed interval [0, 1].
pub fn is_fraction(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}
