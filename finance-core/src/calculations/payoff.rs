//! Snowball and avalanche debt payoff simulation.
//!
//! # Monthly Step
//!
//! | Step | Action |
//! |------|--------|
//! | 1 | Accrue one month of interest on every outstanding debt |
//! | 2 | Pay each outstanding debt its minimum, capped at its balance |
//! | 3 | Direct the freed budget at outstanding debts in priority order |
//! | 4 | Mark debts that reached zero as paid off this month |
//!
//! The freed budget in step 3 is the extra monthly payment, plus the
//! minimums of debts already paid off (the rollover), plus any part of this
//! month's minimums that a capped payment left unused. It goes first to the
//! highest-priority outstanding debt; whatever that debt cannot absorb moves
//! on to the next one.
//!
//! # Termination
//!
//! The run ends once every balance is zero. A month counts as progress when
//! any outstanding balance ends lower than it started, a debt is paid off, or
//! the total balance reaches a new low; the total may keep rising while a
//! cheaper debt is cleared and its minimum rolls over. The run fails with
//! [`DebtError::Unpayable`] when
//! [`STALL_WINDOW_MONTHS`](crate::calculations::amortization::STALL_WINDOW_MONTHS)
//! pass without progress, when [`MAX_MONTHS`] is reached, or when a total
//! grows beyond what a `Decimal` can hold.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use finance_core::{Debt, PayoffStrategy, SimulationScenario};
//! use finance_core::calculations::simulate;
//!
//! let scenario = SimulationScenario {
//!     debts: vec![
//!         Debt::new("car", dec!(1000), dec!(20), dec!(50)),
//!         Debt::new("card", dec!(500), dec!(5), dec!(50)),
//!     ],
//!     extra_monthly_payment: dec!(100),
//!     strategy: PayoffStrategy::Snowball,
//! };
//!
//! let result = simulate(&scenario).unwrap();
//!
//! assert_eq!(result.order, vec!["card".to_string(), "car".to_string()]);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::calculations::amortization::{
    DebtError, MAX_MONTHS, ProgressTracker, accrue_interest, apply_payment, validate_debt,
};
use crate::models::{Debt, DebtPayoff, PayoffStrategy, PayoffStrategyResult, SimulationScenario};

/// A debt as it evolves during one simulation run.
#[derive(Debug, Clone)]
struct WorkingDebt<'a> {
    id: &'a str,
    balance: Decimal,
    annual_rate_percent: Decimal,
    minimum_payment: Decimal,
    interest_paid: Decimal,
    paid_off_month: Option<u32>,
}

impl<'a> WorkingDebt<'a> {
    fn from_debt(debt: &'a Debt) -> Self {
        Self {
            id: &debt.id,
            balance: debt.outstanding_balance,
            annual_rate_percent: debt.annual_rate_percent,
            minimum_payment: debt.minimum_payment,
            interest_paid: Decimal::ZERO,
            paid_off_month: debt.outstanding_balance.is_zero().then_some(0),
        }
    }

    fn is_outstanding(&self) -> bool {
        self.paid_off_month.is_none()
    }
}

/// Sorts debts into targeting priority for `strategy`.
///
/// Snowball orders by ascending balance, avalanche by descending rate; ties
/// fall back to ascending id so the order is fully deterministic.
pub fn priority_order(
    debts: &[Debt],
    strategy: PayoffStrategy,
) -> Vec<&Debt> {
    let mut ordered: Vec<&Debt> = debts.iter().collect();
    ordered.sort_by(|a, b| compare_priority(a, b, strategy));
    ordered
}

fn compare_priority(
    a: &Debt,
    b: &Debt,
    strategy: PayoffStrategy,
) -> Ordering {
    let primary = match strategy {
        PayoffStrategy::Snowball => a.outstanding_balance.cmp(&b.outstanding_balance),
        PayoffStrategy::Avalanche => b.annual_rate_percent.cmp(&a.annual_rate_percent),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Simulates a payoff scenario month by month.
///
/// Works on its own copy of the scenario's debts; the caller's values are
/// never modified.
#[derive(Debug, Clone, Copy)]
pub struct DebtPayoffSimulator<'a> {
    scenario: &'a SimulationScenario,
}

impl<'a> DebtPayoffSimulator<'a> {
    pub fn new(scenario: &'a SimulationScenario) -> Self {
        Self { scenario }
    }

    /// Validates every debt, rejects duplicate ids, and rejects a negative
    /// extra payment.
    pub fn validate(&self) -> Result<(), DebtError> {
        let mut seen = HashSet::new();
        for debt in &self.scenario.debts {
            validate_debt(debt)?;
            if !seen.insert(debt.id.as_str()) {
                return Err(DebtError::InvalidDebt {
                    id: debt.id.clone(),
                    reason: "duplicate debt id".to_string(),
                });
            }
        }
        if self.scenario.extra_monthly_payment < Decimal::ZERO {
            return Err(DebtError::InvalidDebt {
                id: "<scenario>".to_string(),
                reason: format!(
                    "extra monthly payment must be non-negative, got {}",
                    self.scenario.extra_monthly_payment
                ),
            });
        }
        Ok(())
    }

    /// Runs the simulation to completion.
    ///
    /// # Errors
    ///
    /// - [`DebtError::InvalidDebt`] if validation fails; nothing is simulated
    /// - [`DebtError::Unpayable`] with the month at which the run gave up
    pub fn simulate(&self) -> Result<PayoffStrategyResult, DebtError> {
        self.validate()?;

        let strategy = self.scenario.strategy;
        let extra = self.scenario.extra_monthly_payment;
        let mut working: Vec<WorkingDebt<'_>> = priority_order(&self.scenario.debts, strategy)
            .into_iter()
            .map(WorkingDebt::from_debt)
            .collect();

        let starting_total =
            checked_sum(working.iter().map(|d| d.balance)).ok_or(DebtError::Unpayable { month: 0 })?;
        let mut tracker = ProgressTracker::new(starting_total);
        let mut month = 0;

        while let Some(target) = working.iter().position(|d| d.is_outstanding()) {
            if month >= MAX_MONTHS {
                return Err(DebtError::Unpayable { month });
            }
            month += 1;

            let opening: Vec<Decimal> = working.iter().map(|d| d.balance).collect();

            self.accrue_month(&mut working, month)?;
            let freed = self.pay_minimums(&mut working, extra);
            self.apply_surplus(&mut working, freed);
            let paid_this_month = self.record_payoffs(&mut working, month);

            let total = checked_sum(working.iter().map(|d| d.balance))
                .ok_or(DebtError::Unpayable { month })?;
            let any_shrank = working
                .iter()
                .zip(&opening)
                .any(|(d, before)| d.is_outstanding() && d.balance < *before);
            trace!(month, %total, targeted = working[target].id, "simulated month");

            if tracker.record(total, paid_this_month || any_shrank) {
                return Err(DebtError::Unpayable { month });
            }
        }

        let result = self.build_result(&working, starting_total, month)?;
        debug!(
            %strategy,
            total_months = result.total_months,
            total_interest = %result.total_interest_paid,
            "simulation complete"
        );
        Ok(result)
    }

    /// Step 1: interest on every outstanding debt.
    fn accrue_month(
        &self,
        working: &mut [WorkingDebt<'_>],
        month: u32,
    ) -> Result<(), DebtError> {
        for debt in working.iter_mut().filter(|d| d.is_outstanding()) {
            let (balance, interest) = accrue_interest(debt.balance, debt.annual_rate_percent)
                .ok_or(DebtError::Unpayable { month })?;
            debt.balance = balance;
            debt.interest_paid = debt
                .interest_paid
                .checked_add(interest)
                .ok_or(DebtError::Unpayable { month })?;
        }
        Ok(())
    }

    /// Step 2: minimum payments. Returns the budget left over for step 3.
    ///
    /// The budget saturates: anything beyond `Decimal::MAX` could never be
    /// applied against balances that themselves fit in a `Decimal`.
    fn pay_minimums(
        &self,
        working: &mut [WorkingDebt<'_>],
        extra: Decimal,
    ) -> Decimal {
        let mut freed = extra;
        for debt in working.iter_mut() {
            if !debt.is_outstanding() {
                freed = freed.saturating_add(debt.minimum_payment);
                continue;
            }
            let (balance, applied) = apply_payment(debt.balance, debt.minimum_payment);
            debt.balance = balance;
            freed = freed.saturating_add(debt.minimum_payment - applied);
        }
        freed
    }

    /// Step 3: surplus to outstanding debts in priority order.
    fn apply_surplus(
        &self,
        working: &mut [WorkingDebt<'_>],
        mut freed: Decimal,
    ) {
        for debt in working.iter_mut().filter(|d| d.is_outstanding()) {
            if freed <= Decimal::ZERO {
                break;
            }
            let (balance, applied) = apply_payment(debt.balance, freed);
            debt.balance = balance;
            freed -= applied;
        }
    }

    /// Step 4: returns true if any debt was paid off this month.
    fn record_payoffs(
        &self,
        working: &mut [WorkingDebt<'_>],
        month: u32,
    ) -> bool {
        let mut any = false;
        for debt in working.iter_mut() {
            if debt.is_outstanding() && debt.balance <= Decimal::ZERO {
                debt.balance = Decimal::ZERO;
                debt.paid_off_month = Some(month);
                any = true;
                debug!(debt = debt.id, month, "debt paid off");
            }
        }
        any
    }

    fn build_result(
        &self,
        working: &[WorkingDebt<'_>],
        starting_total: Decimal,
        month: u32,
    ) -> Result<PayoffStrategyResult, DebtError> {
        let total_interest_paid = checked_sum(working.iter().map(|d| d.interest_paid))
            .ok_or(DebtError::Unpayable { month })?;
        let total_paid = starting_total
            .checked_add(total_interest_paid)
            .ok_or(DebtError::Unpayable { month })?;

        Ok(PayoffStrategyResult {
            strategy: self.scenario.strategy,
            order: working.iter().map(|d| d.id.to_string()).collect(),
            total_months: working
                .iter()
                .filter_map(|d| d.paid_off_month)
                .max()
                .unwrap_or(0),
            total_interest_paid,
            total_paid,
            per_debt_schedule: working
                .iter()
                .map(|d| DebtPayoff {
                    debt_id: d.id.to_string(),
                    months_to_payoff: d.paid_off_month.unwrap_or(0),
                    interest_paid: d.interest_paid,
                })
                .collect(),
        })
    }
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, Decimal::checked_add)
}

/// Runs [`DebtPayoffSimulator::simulate`] for `scenario`.
pub fn simulate(scenario: &SimulationScenario) -> Result<PayoffStrategyResult, DebtError> {
    DebtPayoffSimulator::new(scenario).simulate()
}
