//! Tax and debt calculation engine.
//!
//! Pure, synchronous computations over in-memory values: progressive slab
//! tax, income-category rules, regime assessment, and debt payoff simulation
//! under snowball and avalanche orderings. Inputs are never mutated and no
//! state is shared between calls.

pub mod calculations;
pub mod models;

pub use calculations::{DebtError, SlabTableError, TaxError};
pub use models::*;
