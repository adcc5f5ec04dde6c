//! Output helpers.
//!
//! - aligned-table CSV export (`export`)
//! - analysis JSON export (`export`)

pub mod export;

pub use export::*;
