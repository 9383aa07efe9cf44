//! File formats, comparisons and logging around `finance-core`.
//!
//! Slab tables and debts come from CSV, regimes and category rules from a
//! TOML rules file. The `finance-calc` binary ties these together.

pub mod debt_loader;
pub mod logging;
pub mod money;
pub mod report;
pub mod rules;
pub mod slab_loader;

pub use debt_loader::DebtLoadError;
pub use money::{ParseMoneyError, parse_money};
pub use report::{PayoffComparison, RegimeComparison, compare_regimes, compare_strategies};
pub use rules::{RulesConfig, RulesError};
pub use slab_loader::{SlabLoaderError, SlabRecord, SlabTableLoader, SlabTables};
