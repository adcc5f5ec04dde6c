//! Reporting utilities: formatted terminal output for each analysis section.

pub mod format;

pub use format::*;
