//! CSV loader for debt records.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter.
//!
//! | Column | Required | Type | Notes |
//! |-----------------------|----------|---------|------------------------------------------|
//! | `id` | yes | string | Unique per file |
//! | `principal` | no | money | Defaults to `outstanding_balance` |
//! | `outstanding_balance` | yes | money | |
//! | `annual_rate_percent` | yes | decimal | `18` means 18% a year |
//! | `minimum_payment` | yes | money | |
//!
//! ```csv
//! id,principal,outstanding_balance,annual_rate_percent,minimum_payment
//! card,5000,3200.50,24,90
//! car,,8000,7.5,200
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use finance_core::calculations::amortization::validate_debt;
use finance_core::{Debt, DebtError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::money::{deserialize_money, deserialize_optional_money};

/// Errors that can occur while loading debt records.
#[derive(Debug, Error)]
pub enum DebtLoadError {
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `row` is 1-based, not counting the header.
    #[error("row {row}: {source}")]
    InvalidDebt {
        row: usize,
        #[source]
        source: DebtError,
    },

    #[error("row {row}: duplicate debt id '{id}'")]
    DuplicateId { row: usize, id: String },
}

#[derive(Debug, Deserialize)]
struct DebtRow {
    id: String,
    #[serde(default, deserialize_with = "deserialize_optional_money")]
    principal: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_money")]
    outstanding_balance: Decimal,
    annual_rate_percent: Decimal,
    #[serde(deserialize_with = "deserialize_money")]
    minimum_payment: Decimal,
}

fn convert_row(
    row: DebtRow,
    row_number: usize,
) -> Result<Debt, DebtLoadError> {
    let debt = Debt {
        principal: row.principal.unwrap_or(row.outstanding_balance),
        id: row.id,
        outstanding_balance: row.outstanding_balance,
        annual_rate_percent: row.annual_rate_percent,
        minimum_payment: row.minimum_payment,
    };
    validate_debt(&debt).map_err(|source| DebtLoadError::InvalidDebt {
        row: row_number,
        source,
    })?;
    Ok(debt)
}

/// Parse CSV text into debts, in file order.
///
/// # Errors
///
/// * [`DebtLoadError::Parse`] for structurally invalid CSV
/// * [`DebtLoadError::InvalidDebt`] for a negative balance, rate or payment
/// * [`DebtLoadError::DuplicateId`] when an id repeats
pub fn load_from_str(input: &str) -> Result<Vec<Debt>, DebtLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let mut seen = HashSet::new();
    let mut debts = Vec::new();

    for (index, result) in reader.deserialize::<DebtRow>().enumerate() {
        let row_number = index + 1;
        let debt = convert_row(result?, row_number)?;
        if !seen.insert(debt.id.clone()) {
            return Err(DebtLoadError::DuplicateId {
                row: row_number,
                id: debt.id,
            });
        }
        debts.push(debt);
    }

    Ok(debts)
}

/// Read and parse a debts CSV file.
pub fn load_from_file(path: &Path) -> Result<Vec<Debt>, DebtLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| DebtLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn load_minimal_row() {
        let csv = "id,outstanding_balance,annual_rate_percent,minimum_payment\ncard,3200.50,24,90";

        let debts = load_from_str(csv).expect("should parse");

        assert_eq!(
            debts,
            vec![Debt {
                id: "card".to_string(),
                principal: dec!(3200.50),
                outstanding_balance: dec!(3200.50),
                annual_rate_percent: dec!(24),
                minimum_payment: dec!(90),
            }]
        );
    }

    #[test]
    fn load_explicit_principal_and_grouped_amounts() {
        let csv = "id,principal,outstanding_balance,annual_rate_percent,minimum_payment\n\
                   home,\"2,50,000\",\"1,80,000\",8.5,\"2,400\"";

        let debts = load_from_str(csv).expect("should parse");

        assert_eq!(debts[0].principal, dec!(250000));
        assert_eq!(debts[0].outstanding_balance, dec!(180000));
        assert_eq!(debts[0].minimum_payment, dec!(2400));
    }

    #[test]
    fn load_tolerates_whitespace_and_column_order() {
        let csv = "minimum_payment, id , annual_rate_percent,outstanding_balance\n 40 , store , 18 , 1200 ";

        let debts = load_from_str(csv).expect("should parse");

        assert_eq!(debts[0].id, "store");
        assert_eq!(debts[0].minimum_payment, dec!(40));
    }

    #[test]
    fn load_rejects_negative_rate_with_row_number() {
        let csv = "id,outstanding_balance,annual_rate_percent,minimum_payment\n\
                   ok,100,5,10\n\
                   bad,100,-5,10";

        let err = load_from_str(csv).expect_err("negative rate should fail");

        let DebtLoadError::InvalidDebt { row, source } = err else {
            panic!("expected InvalidDebt, got {err:?}");
        };
        assert_eq!(row, 2);
        assert!(matches!(source, DebtError::InvalidDebt { id, .. } if id == "bad"));
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let csv = "id,outstanding_balance,annual_rate_percent,minimum_payment\n\
                   card,100,5,10\n\
                   card,200,5,10";

        let err = load_from_str(csv).expect_err("duplicate should fail");

        assert!(matches!(err, DebtLoadError::DuplicateId { row: 2, .. }));
    }

    #[test]
    fn load_rejects_missing_required_column() {
        let csv = "id,outstanding_balance\ncard,100";

        assert!(matches!(load_from_str(csv), Err(DebtLoadError::Parse(_))));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = load_from_file(Path::new("/definitely/not/here.csv")).expect_err("should fail");

        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
