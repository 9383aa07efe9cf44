//! Progressive slab tax calculation.
//!
//! A slab table is an ordered list of contiguous income ranges, each taxed at
//! its own marginal rate. Income fills the slabs from the bottom up: each slab
//! takes as much of the remaining income as its width allows.
//!
//! # Slab Table Rules
//!
//! | Rule | Error |
//! |------|-------|
//! | At least one slab | [`SlabTableError::Empty`] |
//! | First slab starts at zero | [`SlabTableError::FirstSlabNotAtZero`] |
//! | Each bounded slab has `upper > lower` | [`SlabTableError::EmptyRange`] |
//! | Each slab starts where the previous one ends | [`SlabTableError::NonContiguous`] |
//! | Only the last slab is unbounded | [`SlabTableError::UnboundedBeforeLast`] |
//! | The last slab is unbounded | [`SlabTableError::LastSlabBounded`] |
//! | Every rate lies in [0, 1] | [`SlabTableError::RateOutOfRange`] |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use finance_core::TaxSlab;
//! use finance_core::calculations::ProgressiveTaxCalculator;
//!
//! let slabs = vec![
//!     TaxSlab::new(dec!(0), Some(dec!(300000)), dec!(0)),
//!     TaxSlab::new(dec!(300000), Some(dec!(600000)), dec!(0.05)),
//!     TaxSlab::new(dec!(600000), None, dec!(0.20)),
//! ];
//!
//! let result = ProgressiveTaxCalculator::new(&slabs)
//!     .compute(dec!(500000))
//!     .unwrap();
//!
//! assert_eq!(result.total_tax, dec!(10000));
//! assert_eq!(result.effective_rate, dec!(0.02));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::trace;

use crate::calculations::common::{is_fraction, ratio};
use crate::models::{SlabTax, TaxResult, TaxSlab};

/// A slab table that breaks the ordering or contiguity rules.
///
/// This is a configuration bug, never a user input problem, and is never
/// silently corrected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlabTableError {
    #[error("slab table is empty")]
    Empty,

    #[error("first slab must start at 0, starts at {0}")]
    FirstSlabNotAtZero(Decimal),

    #[error("slab {index} has an empty range {lower}..{upper}")]
    EmptyRange {
        index: usize,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("slab {index} starts at {found} but the previous slab ends at {expected}")]
    NonContiguous {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("slab {index} is unbounded but is not the last slab")]
    UnboundedBeforeLast { index: usize },

    #[error("last slab must be unbounded, ends at {0}")]
    LastSlabBounded(Decimal),

    #[error("slab {index} rate must be between 0 and 1, got {rate}")]
    RateOutOfRange { index: usize, rate: Decimal },
}

/// Errors from tax computations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxError {
    #[error("invalid slab table: {0}")]
    InvalidSlabTable(#[from] SlabTableError),

    #[error("taxable amount must be non-negative, got {0}")]
    NegativeIncome(Decimal),

    #[error("invalid income category rule: {0}")]
    InvalidRule(String),

    #[error("invalid tax regime '{name}': {reason}")]
    InvalidRegime { name: String, reason: String },

    #[error("no tax rule configured for income category '{0}'")]
    UnknownCategory(String),
}

/// Checks a slab table against the ordering and contiguity rules.
///
/// # Errors
///
/// Returns the first [`SlabTableError`] found, scanning slabs in order.
pub fn validate_slabs(slabs: &[TaxSlab]) -> Result<(), SlabTableError> {
    let first = slabs.first().ok_or(SlabTableError::Empty)?;
    if !first.lower_bound.is_zero() {
        return Err(SlabTableError::FirstSlabNotAtZero(first.lower_bound));
    }

    let last_index = slabs.len() - 1;
    let mut previous_upper: Option<Decimal> = None;

    for (index, slab) in slabs.iter().enumerate() {
        if !is_fraction(slab.rate) {
            return Err(SlabTableError::RateOutOfRange {
                index,
                rate: slab.rate,
            });
        }

        if let Some(expected) = previous_upper {
            if slab.lower_bound != expected {
                return Err(SlabTableError::NonContiguous {
                    index,
                    expected,
                    found: slab.lower_bound,
                });
            }
        }

        match slab.upper_bound {
            Some(upper) if upper <= slab.lower_bound => {
                return Err(SlabTableError::EmptyRange {
                    index,
                    lower: slab.lower_bound,
                    upper,
                });
            }
            Some(upper) if index == last_index => {
                return Err(SlabTableError::LastSlabBounded(upper));
            }
            Some(upper) => previous_upper = Some(upper),
            None if index != last_index => {
                return Err(SlabTableError::UnboundedBeforeLast { index });
            }
            None => {}
        }
    }

    Ok(())
}

/// Applies a slab table to taxable amounts.
///
/// Borrowing the table keeps the calculator free to share across threads;
/// each call builds a fresh [`TaxResult`].
#[derive(Debug, Clone, Copy)]
pub struct ProgressiveTaxCalculator<'a> {
    slabs: &'a [TaxSlab],
}

impl<'a> ProgressiveTaxCalculator<'a> {
    /// Creates a calculator over `slabs`, which should be sorted ascending by
    /// `lower_bound` and end with an unbounded slab.
    pub fn new(slabs: &'a [TaxSlab]) -> Self {
        Self { slabs }
    }

    pub fn slabs(&self) -> &'a [TaxSlab] {
        self.slabs
    }

    /// Validates the slab table without computing anything.
    pub fn validate(&self) -> Result<(), SlabTableError> {
        validate_slabs(self.slabs)
    }

    /// Computes tax on `taxable_income`.
    ///
    /// Every slab appears in the breakdown; slabs above the income level
    /// carry zero. Nothing is rounded, so the per-slab taxes always add up
    /// to `total_tax` exactly.
    ///
    /// # Errors
    ///
    /// - [`TaxError::InvalidSlabTable`] if the table breaks the slab rules
    /// - [`TaxError::NegativeIncome`] if `taxable_income` is below zero
    pub fn compute(
        &self,
        taxable_income: Decimal,
    ) -> Result<TaxResult, TaxError> {
        self.validate()?;
        if taxable_income < Decimal::ZERO {
            return Err(TaxError::NegativeIncome(taxable_income));
        }

        let mut remaining = taxable_income;
        let mut total_tax = Decimal::ZERO;
        let mut per_slab = Vec::with_capacity(self.slabs.len());

        for slab in self.slabs {
            let taxable_in_slab = self.taxable_in_slab(slab, remaining);
            let tax_in_slab = taxable_in_slab * slab.rate;

            total_tax += tax_in_slab;
            remaining -= taxable_in_slab;

            per_slab.push(SlabTax {
                slab: slab.clone(),
                taxable_in_slab,
                tax_in_slab,
            });
        }

        trace!(%taxable_income, %total_tax, slabs = per_slab.len(), "computed slab tax");

        Ok(TaxResult {
            taxable_income,
            total_tax,
            per_slab,
            effective_rate: ratio(total_tax, taxable_income),
        })
    }

    /// Portion of `remaining` income that falls into `slab`.
    fn taxable_in_slab(
        &self,
        slab: &TaxSlab,
        remaining: Decimal,
    ) -> Decimal {
        if remaining <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match slab.width() {
            Some(width) => remaining.min(width),
            None => remaining,
        }
    }
}

/// Computes tax on `taxable_income` under `slabs`.
///
/// Shorthand for [`ProgressiveTaxCalculator::compute`].
pub fn compute_tax(
    taxable_income: Decimal,
    slabs: &[TaxSlab],
) -> Result<TaxResult, TaxError> {
    ProgressiveTaxCalculator::new(slabs).compute(taxable_income)
}
