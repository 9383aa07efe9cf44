mod debt;
mod income_category;
mod tax_regime;
mod tax_slab;

pub use debt::{
    Debt, DebtPayoff, ParseStrategyError, PayoffStrategy, PayoffStrategyResult,
    SimulationScenario,
};
pub use income_category::{CategoryIncome, IncomeCategoryRule};
pub use tax_regime::TaxRegime;
pub use tax_slab::{SlabTax, TaxResult, TaxSlab};
