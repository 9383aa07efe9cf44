//! Tax and debt calculations.
//!
//! - [`progressive`]: slab tables applied to a taxable amount
//! - [`category`]: flat, exempt and slab rules for non-salary income
//! - [`assessment`]: salary plus categories under one regime
//! - [`amortization`]: per-debt monthly steps and single-debt schedules
//! - [`payoff`]: snowball and avalanche simulation across many debts

pub mod amortization;
pub mod assessment;
pub mod category;
pub mod common;
pub mod payoff;
pub mod progressive;

pub use amortization::{AmortizationRow, DebtError, amortization_schedule};
pub use assessment::{CategoryTax, RuleBook, TaxAssessment, TaxAssessor, validate_regime};
pub use payoff::{DebtPayoffSimulator, priority_order, simulate};
pub use progressive::{ProgressiveTaxCalculator, SlabTableError, TaxError, compute_tax, validate_slabs};
