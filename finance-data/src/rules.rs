//! Tax rules file: regimes and income-category rules per tax year.
//!
//! Rates change every year, so they live in a TOML file rather than in code:
//!
//! ```toml
//! [[regimes]]
//! name = "new"
//! tax_year = 2025
//! standard_deduction = "75000"
//! cess_rate = "0.04"
//! slabs = [
//!   { lower_bound = "0", upper_bound = "300000", rate = "0" },
//!   { lower_bound = "300000", upper_bound = "600000", rate = "0.05" },
//!   { lower_bound = "600000", rate = "0.20" },
//! ]
//!
//! [categories.capital_gains_long]
//! kind = "flat_rate_with_exemption"
//! rate = "0.10"
//! exemption = "100000"
//! ```
//!
//! The whole file is validated on load; a bad slab table or rate is reported
//! with the regime or category it belongs to.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use finance_core::calculations::{RuleBook, validate_regime};
use finance_core::{TaxError, TaxRegime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("cannot read rules file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rules file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("regime '{name}' for {tax_year} is defined more than once")]
    DuplicateRegime { name: String, tax_year: i32 },

    #[error("regime '{name}': {source}")]
    InvalidRegime {
        name: String,
        #[source]
        source: TaxError,
    },

    #[error("category '{name}': {source}")]
    InvalidCategory {
        name: String,
        #[source]
        source: TaxError,
    },

    #[error("no regime named '{name}'{}", year_suffix(.tax_year))]
    RegimeNotFound { name: String, tax_year: Option<i32> },
}

fn year_suffix(tax_year: &Option<i32>) -> String {
    tax_year.map(|year| format!(" for {year}")).unwrap_or_default()
}

/// Parsed contents of a rules file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub regimes: Vec<TaxRegime>,
    #[serde(default)]
    pub categories: RuleBook,
}

impl RulesConfig {
    /// Parses and validates rules from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, RulesError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        debug!(
            regimes = config.regimes.len(),
            categories = config.categories.len(),
            "loaded tax rules"
        );
        Ok(config)
    }

    /// Reads, parses and validates a rules file.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let contents = fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks every regime and category, and that each (name, year) pair is
    /// unique.
    pub fn validate(&self) -> Result<(), RulesError> {
        let mut seen = HashSet::new();
        for regime in &self.regimes {
            if !seen.insert((regime.name.as_str(), regime.tax_year)) {
                return Err(RulesError::DuplicateRegime {
                    name: regime.name.clone(),
                    tax_year: regime.tax_year,
                });
            }
            validate_regime(regime).map_err(|source| RulesError::InvalidRegime {
                name: regime.name.clone(),
                source,
            })?;
        }

        for (name, rule) in &self.categories {
            rule.validate().map_err(|source| RulesError::InvalidCategory {
                name: name.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Finds a regime by name. Without a year, the latest year wins.
    pub fn regime(
        &self,
        name: &str,
        tax_year: Option<i32>,
    ) -> Result<&TaxRegime, RulesError> {
        self.regimes
            .iter()
            .filter(|r| r.name == name && tax_year.is_none_or(|year| r.tax_year == year))
            .max_by_key(|r| r.tax_year)
            .ok_or_else(|| RulesError::RegimeNotFound {
                name: name.to_string(),
                tax_year,
            })
    }
}

#[cfg(test)]
mod tests {
    use finance_core::{IncomeCategoryRule, SlabTableError, TaxSlab};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const RULES: &str = r#"
[[regimes]]
name = "new"
tax_year = 2024
standard_deduction = "50000"
slabs = [
  { lower_bound = "0", upper_bound = "300000", rate = "0" },
  { lower_bound = "300000", rate = "0.05" },
]

[[regimes]]
name = "new"
tax_year = 2025
standard_deduction = "75000"
cess_rate = "0.04"
slabs = [
  { lower_bound = "0", upper_bound = "300000", rate = "0" },
  { lower_bound = "300000", upper_bound = "600000", rate = "0.05" },
  { lower_bound = "600000", rate = "0.20" },
]

[categories.capital_gains_short]
kind = "flat_rate"
rate = "0.15"

[categories.rental]
kind = "flat_rate_after_deduction"
rate = "0.30"
deduction_fraction = "0.30"

[categories.agricultural]
kind = "exempt"

[categories.lottery]
kind = "slab_based"
slabs = [
  { lower_bound = "0", upper_bound = "10000", rate = "0" },
  { lower_bound = "10000", rate = "0.30" },
]
"#;

    #[test]
    fn parses_regimes_and_categories() {
        let config = RulesConfig::from_toml_str(RULES).expect("rules should parse");

        assert_eq!(config.regimes.len(), 2);
        assert_eq!(config.categories.len(), 4);
        assert_eq!(
            config.categories["rental"],
            IncomeCategoryRule::FlatRateAfterDeduction {
                rate: dec!(0.30),
                deduction_fraction: dec!(0.30),
            }
        );
        assert_eq!(config.categories["agricultural"], IncomeCategoryRule::Exempt);
    }

    #[test]
    fn unbounded_slab_has_no_upper_bound() {
        let config = RulesConfig::from_toml_str(RULES).expect("rules should parse");

        let regime = config.regime("new", Some(2025)).expect("regime exists");

        assert_eq!(regime.slabs[2], TaxSlab::new(dec!(600000), None, dec!(0.20)));
        assert_eq!(regime.cess_rate, Some(dec!(0.04)));
    }

    #[test]
    fn regime_lookup_without_year_picks_latest() {
        let config = RulesConfig::from_toml_str(RULES).expect("rules should parse");

        let regime = config.regime("new", None).expect("regime exists");

        assert_eq!(regime.tax_year, 2025);
    }

    #[test]
    fn regime_lookup_reports_missing_year() {
        let config = RulesConfig::from_toml_str(RULES).expect("rules should parse");

        let err = config.regime("new", Some(2019)).expect_err("should be missing");

        assert_eq!(err.to_string(), "no regime named 'new' for 2019");
    }

    #[test]
    fn missing_cess_defaults_to_none() {
        let config = RulesConfig::from_toml_str(RULES).expect("rules should parse");

        assert_eq!(config.regime("new", Some(2024)).unwrap().cess_rate, None);
    }

    #[test]
    fn rejects_invalid_slab_table() {
        let toml = r#"
[[regimes]]
name = "broken"
tax_year = 2025
slabs = [{ lower_bound = "0", upper_bound = "100", rate = "0.1" }]
"#;

        let err = RulesConfig::from_toml_str(toml).expect_err("should fail");

        let RulesError::InvalidRegime { name, source } = err else {
            panic!("expected InvalidRegime, got {err:?}");
        };
        assert_eq!(name, "broken");
        assert_eq!(
            source,
            TaxError::InvalidSlabTable(SlabTableError::LastSlabBounded(dec!(100)))
        );
    }

    #[test]
    fn rejects_invalid_category_rate() {
        let toml = r#"
[categories.others]
kind = "flat_rate"
rate = "30"
"#;

        let err = RulesConfig::from_toml_str(toml).expect_err("should fail");

        assert!(matches!(err, RulesError::InvalidCategory { ref name, .. } if name == "others"));
    }

    #[test]
    fn rejects_duplicate_regime() {
        let toml = r#"
[[regimes]]
name = "new"
tax_year = 2025
slabs = [{ lower_bound = "0", rate = "0.1" }]

[[regimes]]
name = "new"
tax_year = 2025
slabs = [{ lower_bound = "0", rate = "0.2" }]
"#;

        let err = RulesConfig::from_toml_str(toml).expect_err("should fail");

        assert!(matches!(err, RulesError::DuplicateRegime { tax_year: 2025, .. }));
    }

    #[test]
    fn rejects_unknown_rule_kind() {
        let toml = r#"
[categories.crypto]
kind = "vibes"
"#;

        assert!(matches!(
            RulesConfig::from_toml_str(toml),
            Err(RulesError::Parse(_))
        ));
    }

    #[test]
    fn empty_file_is_an_empty_config() {
        let config = RulesConfig::from_toml_str("").expect("empty file should parse");

        assert_eq!(config, RulesConfig::default());
    }
}
