//! Tax rules for non-salary income categories.
//!
//! Each category (capital gains, rental income, interest, ...) carries one
//! [`IncomeCategoryRule`]. All variants share the same contract: given a
//! non-negative amount, return the tax due on it.

use rust_decimal::Decimal;

use crate::calculations::common::{is_fraction, non_negative};
use crate::calculations::progressive::{ProgressiveTaxCalculator, TaxError, validate_slabs};
use crate::models::IncomeCategoryRule;

impl IncomeCategoryRule {
    /// Checks rates, exemptions and embedded slab tables.
    ///
    /// # Errors
    ///
    /// - [`TaxError::InvalidRule`] for a rate or deduction fraction outside
    ///   [0, 1], or a negative exemption
    /// - [`TaxError::InvalidSlabTable`] for a malformed `SlabBased` table
    pub fn validate(&self) -> Result<(), TaxError> {
        match self {
            Self::FlatRate { rate } => check_rate(*rate),
            Self::FlatRateWithExemption { rate, exemption } => {
                check_rate(*rate)?;
                if *exemption < Decimal::ZERO {
                    return Err(TaxError::InvalidRule(format!(
                        "exemption must be non-negative, got {exemption}"
                    )));
                }
                Ok(())
            }
            Self::FlatRateAfterDeduction {
                rate,
                deduction_fraction,
            } => {
                check_rate(*rate)?;
                if !is_fraction(*deduction_fraction) {
                    return Err(TaxError::InvalidRule(format!(
                        "deduction fraction must be between 0 and 1, got {deduction_fraction}"
                    )));
                }
                Ok(())
            }
            Self::SlabBased { slabs } => Ok(validate_slabs(slabs)?),
            Self::Exempt => Ok(()),
        }
    }

    /// Computes the tax due on `amount` under this rule.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::NegativeIncome`] for a negative amount, or any
    /// error from [`IncomeCategoryRule::validate`].
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use finance_core::IncomeCategoryRule;
    ///
    /// let rental = IncomeCategoryRule::FlatRateAfterDeduction {
    ///     rate: dec!(0.30),
    ///     deduction_fraction: dec!(0.30),
    /// };
    ///
    /// assert_eq!(rental.compute_tax(dec!(100000)).unwrap(), dec!(21000));
    /// ```
    pub fn compute_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, TaxError> {
        if amount < Decimal::ZERO {
            return Err(TaxError::NegativeIncome(amount));
        }
        self.validate()?;

        let tax = match self {
            Self::FlatRate { rate } => amount * rate,
            Self::FlatRateWithExemption { rate, exemption } => {
                non_negative(amount - exemption) * rate
            }
            Self::FlatRateAfterDeduction {
                rate,
                deduction_fraction,
            } => amount * (Decimal::ONE - deduction_fraction) * rate,
            Self::SlabBased { slabs } => {
                ProgressiveTaxCalculator::new(slabs)
                    .compute(amount)?
                    .total_tax
            }
            Self::Exempt => Decimal::ZERO,
        };

        Ok(tax)
    }
}

fn check_rate(rate: Decimal) -> Result<(), TaxError> {
    if is_fraction(rate) {
        Ok(())
    } else {
        Err(TaxError::InvalidRule(format!(
            "rate must be between 0 and 1, got {rate}"
        )))
    }
}
