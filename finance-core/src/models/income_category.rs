use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TaxSlab;

/// How a non-salary income category is taxed.
///
/// Rates are configuration, loaded per tax year; none of them are built in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomeCategoryRule {
    /// The whole amount is taxed at `rate`.
    FlatRate { rate: Decimal },

    /// The first `exemption` is tax free, the rest is taxed at `rate`.
    FlatRateWithExemption { rate: Decimal, exemption: Decimal },

    /// A fraction of the amount is deducted first, the rest is taxed at `rate`
    /// (e.g. rental income after a standard repairs deduction).
    FlatRateAfterDeduction {
        rate: Decimal,
        deduction_fraction: Decimal,
    },

    /// The amount is run through its own slab table.
    SlabBased { slabs: Vec<TaxSlab> },

    /// No tax is due.
    Exempt,
}

/// An amount of income attributed to a named category in a rule book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIncome {
    pub category: String,
    pub amount: Decimal,
}

impl CategoryIncome {
    pub fn new(
        category: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}
