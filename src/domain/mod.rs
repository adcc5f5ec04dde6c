//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the series catalog (`SeriesKey`, `Provider`)
//! - raw observations (`Observation`, `RawSeries`)
//! - the aligned month-end table (`AlignedTable`) and calendar helpers

pub mod types;

pub use types::*;
