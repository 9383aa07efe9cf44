//! CSV loader for slab tables.
//!
//! ## CSV Format
//!
//! | Column | Required | Type | Notes |
//! |---------------|----------|---------|--------------------------------------|
//! | `regime` | yes | string | Table name, e.g. `new` or `old` |
//! | `lower_bound` | yes | money | Inclusive lower edge of the slab |
//! | `upper_bound` | no | money | Leave empty for the unbounded slab |
//! | `rate` | yes | decimal | Marginal rate as a fraction, `0.05` |
//!
//! ```csv
//! regime,lower_bound,upper_bound,rate
//! new,0,300000,0
//! new,300000,600000,0.05
//! new,600000,,0.20
//! ```
//!
//! Rows of one regime must appear in ascending order; they are kept in file
//! order and the assembled table is validated as a whole.

use std::collections::BTreeMap;
use std::io::Read;

use finance_core::{SlabTableError, TaxSlab};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::money::{deserialize_money, deserialize_optional_money};

/// Errors that can occur when loading slab tables.
#[derive(Debug, Error)]
pub enum SlabLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("slab table '{regime}' is invalid: {source}")]
    InvalidTable {
        regime: String,
        #[source]
        source: SlabTableError,
    },

    #[error("slab table '{0}' not found")]
    UnknownRegime(String),
}

impl From<csv::Error> for SlabLoaderError {
    fn from(err: csv::Error) -> Self {
        SlabLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the slab CSV file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlabRecord {
    pub regime: String,
    #[serde(deserialize_with = "deserialize_money")]
    pub lower_bound: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_money")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl From<&SlabRecord> for TaxSlab {
    fn from(record: &SlabRecord) -> Self {
        TaxSlab::new(record.lower_bound, record.upper_bound, record.rate)
    }
}

/// Slab tables keyed by regime name.
pub type SlabTables = BTreeMap<String, Vec<TaxSlab>>;

/// Loader for slab tables from CSV files.
pub struct SlabTableLoader;

impl SlabTableLoader {
    /// Parse slab records from a CSV reader, in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, SlabLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SlabRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into one validated table per regime.
    pub fn group(records: &[SlabRecord]) -> Result<SlabTables, SlabLoaderError> {
        let mut tables = SlabTables::new();
        for record in records {
            tables
                .entry(record.regime.clone())
                .or_default()
                .push(TaxSlab::from(record));
        }

        for (regime, slabs) in &tables {
            finance_core::calculations::validate_slabs(slabs).map_err(|source| {
                SlabLoaderError::InvalidTable {
                    regime: regime.clone(),
                    source,
                }
            })?;
            debug!(%regime, slabs = slabs.len(), "loaded slab table");
        }

        Ok(tables)
    }

    /// Parse and group in one step.
    pub fn load<R: Read>(reader: R) -> Result<SlabTables, SlabLoaderError> {
        let records = Self::parse(reader)?;
        Self::group(&records)
    }
}
