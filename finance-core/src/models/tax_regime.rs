use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TaxSlab;

/// A named salary-tax regime for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRegime {
    pub name: String,
    pub tax_year: i32,
    #[serde(default)]
    pub standard_deduction: Decimal,
    /// Surcharge levied on the computed tax (e.g. a 4% education cess).
    #[serde(default)]
    pub cess_rate: Option<Decimal>,
    pub slabs: Vec<TaxSlab>,
}
