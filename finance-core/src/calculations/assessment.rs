//! Whole-return tax assessment under a single regime.
//!
//! Salary is reduced by the regime's standard deduction and run through the
//! regime's slab table. Every other income source is priced by the rule for
//! its category. An optional cess is levied on the combined tax.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{is_fraction, non_negative, ratio};
use crate::calculations::progressive::{ProgressiveTaxCalculator, TaxError};
use crate::models::{CategoryIncome, IncomeCategoryRule, TaxRegime, TaxResult};

/// Category name to tax rule. Ordered so reports list categories stably.
pub type RuleBook = BTreeMap<String, IncomeCategoryRule>;

/// Tax due on one category of income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTax {
    pub category: String,
    pub amount: Decimal,
    pub tax: Decimal,
}

/// Full breakdown of an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAssessment {
    pub regime: String,
    pub tax_year: i32,
    /// Salary plus every category amount, before deductions.
    pub gross_income: Decimal,
    pub taxable_salary: Decimal,
    pub slab_result: TaxResult,
    pub category_taxes: Vec<CategoryTax>,
    pub tax_before_cess: Decimal,
    pub cess: Decimal,
    pub total_tax: Decimal,
    /// `total_tax / gross_income`, or zero with no income.
    pub effective_rate: Decimal,
}

/// Assesses incomes against one regime and rule book.
#[derive(Debug, Clone, Copy)]
pub struct TaxAssessor<'a> {
    regime: &'a TaxRegime,
    rules: &'a RuleBook,
}

impl<'a> TaxAssessor<'a> {
    pub fn new(
        regime: &'a TaxRegime,
        rules: &'a RuleBook,
    ) -> Self {
        Self { regime, rules }
    }

    /// Validates the regime's deduction, cess and slab table.
    pub fn validate_regime(&self) -> Result<(), TaxError> {
        validate_regime(self.regime)
    }

    /// Assesses `salary` plus `incomes` under this regime.
    ///
    /// # Errors
    ///
    /// - [`TaxError::InvalidRegime`] / [`TaxError::InvalidSlabTable`] for a
    ///   malformed regime
    /// - [`TaxError::UnknownCategory`] when an income names a category that
    ///   has no rule
    /// - [`TaxError::NegativeIncome`] for a negative salary or amount
    pub fn assess(
        &self,
        salary: Decimal,
        incomes: &[CategoryIncome],
    ) -> Result<TaxAssessment, TaxError> {
        self.validate_regime()?;
        if salary < Decimal::ZERO {
            return Err(TaxError::NegativeIncome(salary));
        }

        let taxable_salary = non_negative(salary - self.regime.standard_deduction);
        let slab_result = ProgressiveTaxCalculator::new(&self.regime.slabs).compute(taxable_salary)?;

        let category_taxes = incomes
            .iter()
            .map(|income| self.category_tax(income))
            .collect::<Result<Vec<_>, _>>()?;

        let gross_income = salary + incomes.iter().map(|i| i.amount).sum::<Decimal>();
        let tax_before_cess =
            slab_result.total_tax + category_taxes.iter().map(|c| c.tax).sum::<Decimal>();
        let cess = self
            .regime
            .cess_rate
            .map_or(Decimal::ZERO, |rate| tax_before_cess * rate);
        let total_tax = tax_before_cess + cess;

        debug!(
            regime = %self.regime.name,
            tax_year = self.regime.tax_year,
            %gross_income,
            %total_tax,
            "assessed income"
        );

        Ok(TaxAssessment {
            regime: self.regime.name.clone(),
            tax_year: self.regime.tax_year,
            gross_income,
            taxable_salary,
            slab_result,
            category_taxes,
            tax_before_cess,
            cess,
            total_tax,
            effective_rate: ratio(total_tax, gross_income),
        })
    }

    fn category_tax(
        &self,
        income: &CategoryIncome,
    ) -> Result<CategoryTax, TaxError> {
        let rule = self
            .rules
            .get(&income.category)
            .ok_or_else(|| TaxError::UnknownCategory(income.category.clone()))?;

        Ok(CategoryTax {
            category: income.category.clone(),
            amount: income.amount,
            tax: rule.compute_tax(income.amount)?,
        })
    }
}

/// Checks a regime's standard deduction, cess rate and slab table.
pub fn validate_regime(regime: &TaxRegime) -> Result<(), TaxError> {
    if regime.standard_deduction < Decimal::ZERO {
        return Err(TaxError::InvalidRegime {
            name: regime.name.clone(),
            reason: format!(
                "standard deduction must be non-negative, got {}",
                regime.standard_deduction
            ),
        });
    }
    if let Some(rate) = regime.cess_rate {
        if !is_fraction(rate) {
            return Err(TaxError::InvalidRegime {
                name: regime.name.clone(),
                reason: format!("cess rate must be between 0 and 1, got {rate}"),
            });
        }
    }
    ProgressiveTaxCalculator::new(&regime.slabs).validate()?;
    Ok(())
}
