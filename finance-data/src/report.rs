//! Side-by-side comparisons and plain-text rendering of engine results.
//!
//! The engine answers one question per call; comparing two strategies or two
//! regimes is done here by calling it twice and diffing the results.

use std::fmt;

use finance_core::calculations::common::round_half_up;
use finance_core::calculations::{
    AmortizationRow, RuleBook, TaxAssessment, TaxAssessor, simulate,
};
use finance_core::{
    CategoryIncome, Debt, DebtError, PayoffStrategy, PayoffStrategyResult, SimulationScenario,
    TaxError, TaxRegime, TaxResult,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Snowball and avalanche results for the same debts and budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoffComparison {
    pub snowball: PayoffStrategyResult,
    pub avalanche: PayoffStrategyResult,
    /// Snowball interest minus avalanche interest, rounded to cents.
    pub interest_saved: Decimal,
    /// Snowball months minus avalanche months.
    pub months_saved: i64,
    pub recommended: PayoffStrategy,
}

/// Runs both strategies and reports what avalanche saves over snowball.
///
/// Avalanche is recommended when it saves interest or time; otherwise
/// snowball wins for its earlier payoffs.
pub fn compare_strategies(
    debts: &[Debt],
    extra_monthly_payment: Decimal,
) -> Result<PayoffComparison, DebtError> {
    let run = |strategy| {
        simulate(&SimulationScenario {
            debts: debts.to_vec(),
            extra_monthly_payment,
            strategy,
        })
    };
    let snowball = run(PayoffStrategy::Snowball)?;
    let avalanche = run(PayoffStrategy::Avalanche)?;

    let interest_saved =
        round_half_up(snowball.total_interest_paid) - round_half_up(avalanche.total_interest_paid);
    let months_saved = i64::from(snowball.total_months) - i64::from(avalanche.total_months);
    let recommended = if interest_saved > Decimal::ZERO || months_saved > 0 {
        PayoffStrategy::Avalanche
    } else {
        PayoffStrategy::Snowball
    };

    Ok(PayoffComparison {
        snowball,
        avalanche,
        interest_saved,
        months_saved,
        recommended,
    })
}

/// Two regimes assessed on the same incomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegimeComparison {
    pub first: TaxAssessment,
    pub second: TaxAssessment,
    /// Name of the regime with the lower total tax; the first on a tie.
    pub cheaper: String,
    /// Absolute difference in total tax, rounded to cents.
    pub savings: Decimal,
}

/// Assesses `salary` and `incomes` under both regimes.
pub fn compare_regimes(
    first: &TaxRegime,
    second: &TaxRegime,
    rules: &RuleBook,
    salary: Decimal,
    incomes: &[CategoryIncome],
) -> Result<RegimeComparison, TaxError> {
    let first = TaxAssessor::new(first, rules).assess(salary, incomes)?;
    let second = TaxAssessor::new(second, rules).assess(salary, incomes)?;

    let first_total = round_half_up(first.total_tax);
    let second_total = round_half_up(second.total_tax);
    let cheaper = if second_total < first_total {
        second.regime.clone()
    } else {
        first.regime.clone()
    };

    Ok(RegimeComparison {
        savings: (first_total - second_total).abs(),
        cheaper,
        first,
        second,
    })
}

fn percent(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).round_dp(2)
}

fn upper_label(upper: Option<Decimal>) -> String {
    upper.map_or_else(|| "and above".to_string(), |u| format!("to {u}"))
}

/// Slab breakdown as an aligned text table.
pub struct TaxResultTable<'a>(pub &'a TaxResult);

impl fmt::Display for TaxResultTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.0.rounded();
        writeln!(f, "{:<28} {:>8} {:>16} {:>14}", "Slab", "Rate", "Taxable", "Tax")?;
        for entry in &result.per_slab {
            let range = format!(
                "{} {}",
                entry.slab.lower_bound,
                upper_label(entry.slab.upper_bound)
            );
            writeln!(
                f,
                "{:<28} {:>7}% {:>16} {:>14}",
                range,
                percent(entry.slab.rate),
                entry.taxable_in_slab,
                entry.tax_in_slab
            )?;
        }
        writeln!(
            f,
            "{:<28} {:>8} {:>16} {:>14}",
            "Total", "", result.taxable_income, result.total_tax
        )?;
        writeln!(f, "Effective rate: {}%", percent(result.effective_rate))
    }
}

/// A regime assessment: slab table, category lines and totals.
pub struct AssessmentReport<'a>(pub &'a TaxAssessment);

impl fmt::Display for AssessmentReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let assessment = self.0;
        writeln!(f, "Regime: {} ({})", assessment.regime, assessment.tax_year)?;
        writeln!(f, "Gross income:   {}", round_half_up(assessment.gross_income))?;
        writeln!(f, "Taxable salary: {}", round_half_up(assessment.taxable_salary))?;
        write!(f, "{}", TaxResultTable(&assessment.slab_result))?;
        for category in &assessment.category_taxes {
            writeln!(
                f,
                "  {:<24} {:>16} -> {:>14}",
                category.category,
                round_half_up(category.amount),
                round_half_up(category.tax)
            )?;
        }
        writeln!(f, "Tax before cess: {}", round_half_up(assessment.tax_before_cess))?;
        writeln!(f, "Cess:            {}", round_half_up(assessment.cess))?;
        writeln!(f, "Total tax:       {}", round_half_up(assessment.total_tax))?;
        writeln!(f, "Effective rate:  {}%", percent(assessment.effective_rate))
    }
}

impl fmt::Display for RegimeComparison {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "{}", AssessmentReport(&self.first))?;
        write!(f, "{}", AssessmentReport(&self.second))?;
        writeln!(f, "\n'{}' is cheaper by {}", self.cheaper, self.savings)
    }
}

/// One strategy's payoff plan, per debt and in total.
pub struct PayoffReport<'a>(pub &'a PayoffStrategyResult);

impl fmt::Display for PayoffReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.0.rounded();
        writeln!(f, "Strategy: {}", result.strategy)?;
        writeln!(f, "{:<20} {:>8} {:>14}", "Debt", "Months", "Interest")?;
        for entry in &result.per_debt_schedule {
            writeln!(
                f,
                "{:<20} {:>8} {:>14}",
                entry.debt_id, entry.months_to_payoff, entry.interest_paid
            )?;
        }
        writeln!(
            f,
            "Debt-free in {} months, {} interest, {} paid in total",
            result.total_months, result.total_interest_paid, result.total_paid
        )
    }
}

impl fmt::Display for PayoffComparison {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "{}", PayoffReport(&self.snowball))?;
        write!(f, "{}", PayoffReport(&self.avalanche))?;
        writeln!(
            f,
            "\nAvalanche saves {} in interest and {} months; recommended: {}",
            self.interest_saved, self.months_saved, self.recommended
        )
    }
}

/// Month-by-month rows of a single-debt schedule.
pub struct ScheduleTable<'a>(pub &'a [AmortizationRow]);

impl fmt::Display for ScheduleTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>14} {:>12} {:>12} {:>14}",
            "Month", "Opening", "Interest", "Payment", "Closing"
        )?;
        for row in self.0 {
            writeln!(
                f,
                "{:>6} {:>14} {:>12} {:>12} {:>14}",
                row.month,
                round_half_up(row.opening_balance),
                round_half_up(row.interest),
                round_half_up(row.payment),
                round_half_up(row.closing_balance)
            )?;
        }
        Ok(())
    }
}

pub fn render_tax_result(result: &TaxResult) -> String {
    TaxResultTable(result).to_string()
}

pub fn render_assessment(assessment: &TaxAssessment) -> String {
    AssessmentReport(assessment).to_string()
}

pub fn render_regime_comparison(comparison: &RegimeComparison) -> String {
    comparison.to_string()
}

pub fn render_payoff(result: &PayoffStrategyResult) -> String {
    PayoffReport(result).to_string()
}

pub fn render_comparison(comparison: &PayoffComparison) -> String {
    comparison.to_string()
}

pub fn render_schedule(rows: &[AmortizationRow]) -> String {
    ScheduleTable(rows).to_string()
}
