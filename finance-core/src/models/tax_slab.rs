use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;

/// A contiguous income range taxed at a single marginal rate.
///
/// The range is inclusive of `lower_bound` and exclusive of `upper_bound`
/// for assignment purposes: income sitting exactly on a boundary belongs to
/// the lower slab. `upper_bound` of `None` means the slab is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub lower_bound: Decimal,
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    /// Width of the slab, or `None` when it is unbounded.
    pub fn width(&self) -> Option<Decimal> {
        self.upper_bound.map(|upper| upper - self.lower_bound)
    }
}

/// The portion of income that fell into one slab and the tax it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabTax {
    pub slab: TaxSlab,
    pub taxable_in_slab: Decimal,
    pub tax_in_slab: Decimal,
}

/// Outcome of applying a slab table to a taxable amount.
///
/// Values are unrounded; use [`TaxResult::rounded`] for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub taxable_income: Decimal,
    pub total_tax: Decimal,
    /// One entry per slab in the table, in ascending order.
    pub per_slab: Vec<SlabTax>,
    pub effective_rate: Decimal,
}

impl TaxResult {
    /// Returns a copy with every money amount rounded half-up to cents and
    /// the effective rate rounded to four places.
    pub fn rounded(&self) -> Self {
        Self {
            taxable_income: round_half_up(self.taxable_income),
            total_tax: round_half_up(self.total_tax),
            per_slab: self
                .per_slab
                .iter()
                .map(|entry| SlabTax {
                    slab: entry.slab.clone(),
                    taxable_in_slab: round_half_up(entry.taxable_in_slab),
                    tax_in_slab: round_half_up(entry.tax_in_slab),
                })
                .collect(),
            effective_rate: self.effective_rate.round_dp_with_strategy(
                4,
                rust_decimal::RoundingStrategy::MidpointAwayFromZero,
            ),
        }
    }
}
