//! Per-debt amortization steps.
//!
//! The payoff simulator and the single-debt schedule both advance balances
//! one month at a time through [`accrue_interest`] and [`apply_payment`], and
//! share the same stall detection so a debt whose payments never outpace its
//! interest is reported instead of looping until the month cap.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Debt;

/// Hard ceiling on simulated months (100 years).
pub const MAX_MONTHS: u32 = 1200;

/// Consecutive months without progress after which a debt is deemed unpayable.
pub const STALL_WINDOW_MONTHS: u32 = 12;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Errors from debt validation and payoff simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DebtError {
    /// A debt (or the scenario around it) failed validation before any
    /// month was simulated.
    #[error("invalid debt '{id}': {reason}")]
    InvalidDebt { id: String, reason: String },

    /// Payments cannot keep pace with interest; balances would grow forever.
    #[error("debts cannot be paid off: no progress by month {month}; increase the monthly payment")]
    Unpayable { month: u32 },
}

impl DebtError {
    fn invalid(
        id: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDebt {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Rejects negative balances, rates and payments.
pub fn validate_debt(debt: &Debt) -> Result<(), DebtError> {
    if debt.outstanding_balance < Decimal::ZERO {
        return Err(DebtError::invalid(
            &debt.id,
            format!(
                "outstanding balance must be non-negative, got {}",
                debt.outstanding_balance
            ),
        ));
    }
    if debt.annual_rate_percent < Decimal::ZERO {
        return Err(DebtError::invalid(
            &debt.id,
            format!(
                "annual rate must be non-negative, got {}",
                debt.annual_rate_percent
            ),
        ));
    }
    if debt.minimum_payment < Decimal::ZERO {
        return Err(DebtError::invalid(
            &debt.id,
            format!(
                "minimum payment must be non-negative, got {}",
                debt.minimum_payment
            ),
        ));
    }
    Ok(())
}

/// Converts an annual percentage rate into a monthly fraction.
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::calculations::amortization::monthly_rate;
///
/// assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
/// ```
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::ONE_HUNDRED / MONTHS_PER_YEAR
}

/// Adds one month of interest to `balance`.
///
/// Returns `(new_balance, interest)`, or `None` if the balance has grown
/// beyond what a `Decimal` can hold.
pub fn accrue_interest(
    balance: Decimal,
    annual_rate_percent: Decimal,
) -> Option<(Decimal, Decimal)> {
    let interest = balance.checked_mul(monthly_rate(annual_rate_percent))?;
    let new_balance = balance.checked_add(interest)?;
    Some((new_balance, interest))
}

/// Pays up to `amount` against `balance`.
///
/// Returns `(remaining_balance, applied)`; the payment is capped at the
/// balance so nothing is ever overpaid.
pub fn apply_payment(
    balance: Decimal,
    amount: Decimal,
) -> (Decimal, Decimal) {
    let applied = amount.max(Decimal::ZERO).min(balance);
    (balance - applied, applied)
}

/// Watches a run of months for forward progress.
#[derive(Debug, Clone)]
pub(crate) struct ProgressTracker {
    lowest_total: Decimal,
    stalled_months: u32,
}

impl ProgressTracker {
    pub(crate) fn new(starting_total: Decimal) -> Self {
        Self {
            lowest_total: starting_total,
            stalled_months: 0,
        }
    }

    /// Records the end-of-month total; returns true once the stall window is
    /// exhausted. A new low total or an explicit `made_progress` resets it.
    pub(crate) fn record(
        &mut self,
        total: Decimal,
        made_progress: bool,
    ) -> bool {
        if made_progress || total < self.lowest_total {
            self.stalled_months = 0;
        } else {
            self.stalled_months += 1;
        }
        self.lowest_total = self.lowest_total.min(total);
        self.stalled_months >= STALL_WINDOW_MONTHS
    }
}

/// One month of a single-debt amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub opening_balance: Decimal,
    pub interest: Decimal,
    pub payment: Decimal,
    pub closing_balance: Decimal,
}

/// Builds the month-by-month schedule for paying `debt` off with a fixed
/// `monthly_payment`.
///
/// A debt that starts at zero yields an empty schedule.
///
/// # Errors
///
/// - [`DebtError::InvalidDebt`] if the debt or the payment is negative
/// - [`DebtError::Unpayable`] if the payment cannot outpace interest
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use finance_core::Debt;
/// use finance_core::calculations::amortization::amortization_schedule;
///
/// let debt = Debt::new("card", dec!(1000), dec!(12), dec!(50));
/// let rows = amortization_schedule(&debt, dec!(1000)).unwrap();
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].interest, dec!(10));
/// assert_eq!(rows[1].closing_balance, dec!(0));
/// ```
pub fn amortization_schedule(
    debt: &Debt,
    monthly_payment: Decimal,
) -> Result<Vec<AmortizationRow>, DebtError> {
    validate_debt(debt)?;
    if monthly_payment < Decimal::ZERO {
        return Err(DebtError::invalid(
            &debt.id,
            format!("monthly payment must be non-negative, got {monthly_payment}"),
        ));
    }

    let mut rows = Vec::new();
    let mut balance = debt.outstanding_balance;
    let mut tracker = ProgressTracker::new(balance);
    let mut month = 0;

    while balance > Decimal::ZERO {
        if month >= MAX_MONTHS {
            return Err(DebtError::Unpayable { month });
        }
        month += 1;

        let opening_balance = balance;
        let (accrued, interest) = accrue_interest(balance, debt.annual_rate_percent)
            .ok_or(DebtError::Unpayable { month })?;
        let (closing_balance, payment) = apply_payment(accrued, monthly_payment);
        balance = closing_balance;

        rows.push(AmortizationRow {
            month,
            opening_balance,
            interest,
            payment,
            closing_balance,
        });

        if tracker.record(balance, false) {
            return Err(DebtError::Unpayable { month });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // step function tests
    // =========================================================================

    #[test]
    fn accrue_interest_adds_one_twelfth_of_annual_rate() {
        let result = accrue_interest(dec!(1200), dec!(12));

        assert_eq!(result, Some((dec!(1212), dec!(12))));
    }

    #[test]
    fn accrue_interest_at_zero_rate_is_noop() {
        assert_eq!(accrue_interest(dec!(500), dec!(0)), Some((dec!(500), dec!(0))));
    }

    #[test]
    fn accrue_interest_reports_overflow() {
        assert_eq!(accrue_interest(Decimal::MAX, dec!(100)), None);
    }

    #[test]
    fn apply_payment_caps_at_balance() {
        assert_eq!(apply_payment(dec!(40), dec!(100)), (dec!(0), dec!(40)));
    }

    #[test]
    fn apply_payment_reduces_balance() {
        assert_eq!(apply_payment(dec!(400), dec!(100)), (dec!(300), dec!(100)));
    }

    // =========================================================================
    // validate_debt tests
    // =========================================================================

    #[test]
    fn validate_debt_rejects_negative_balance() {
        let debt = Debt::new("a", dec!(-1), dec!(5), dec!(10));

        assert_eq!(
            validate_debt(&debt),
            Err(DebtError::InvalidDebt {
                id: "a".to_string(),
                reason: "outstanding balance must be non-negative, got -1".to_string(),
            })
        );
    }

    #[test]
    fn validate_debt_rejects_negative_rate() {
        let debt = Debt::new("a", dec!(100), dec!(-5), dec!(10));

        assert!(matches!(
            validate_debt(&debt),
            Err(DebtError::InvalidDebt { .. })
        ));
    }

    #[test]
    fn validate_debt_rejects_negative_payment() {
        let debt = Debt::new("a", dec!(100), dec!(5), dec!(-10));

        assert!(matches!(
            validate_debt(&debt),
            Err(DebtError::InvalidDebt { .. })
        ));
    }

    // =========================================================================
    // amortization_schedule tests
    // =========================================================================

    #[test]
    fn schedule_without_interest_is_linear() {
        let debt = Debt::new("loan", dec!(1200), dec!(0), dec!(100));

        let rows = amortization_schedule(&debt, dec!(100)).unwrap();

        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.interest.is_zero()));
        assert_eq!(rows[11].closing_balance, dec!(0));
    }

    #[test]
    fn schedule_last_payment_is_partial() {
        let debt = Debt::new("loan", dec!(250), dec!(0), dec!(100));

        let rows = amortization_schedule(&debt, dec!(100)).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].payment, dec!(50));
    }

    #[test]
    fn schedule_for_zero_balance_is_empty() {
        let debt = Debt::new("done", dec!(0), dec!(18), dec!(25));

        assert_eq!(amortization_schedule(&debt, dec!(25)), Ok(vec![]));
    }

    #[test]
    fn schedule_detects_payment_below_interest() {
        let debt = Debt::new("card", dec!(1000), dec!(24), dec!(10));

        let result = amortization_schedule(&debt, dec!(10));

        assert_eq!(result, Err(DebtError::Unpayable { month: 12 }));
    }

    #[test]
    fn schedule_rejects_negative_payment() {
        let debt = Debt::new("card", dec!(1000), dec!(24), dec!(10));

        assert!(matches!(
            amortization_schedule(&debt, dec!(-1)),
            Err(DebtError::InvalidDebt { .. })
        ));
    }

    // =========================================================================
    // ProgressTracker tests
    // =========================================================================

    #[test]
    fn tracker_resets_on_new_low() {
        let mut tracker = ProgressTracker::new(dec!(100));

        for _ in 0..11 {
            assert!(!tracker.record(dec!(100), false));
        }
        assert!(!tracker.record(dec!(99), false));
        assert_eq!(tracker.stalled_months, 0);
    }

    #[test]
    fn tracker_trips_after_window() {
        let mut tracker = ProgressTracker::new(dec!(100));

        let tripped = (0..STALL_WINDOW_MONTHS)
            .map(|_| tracker.record(dec!(101), false))
            .last();

        assert_eq!(tripped, Some(true));
    }
}
