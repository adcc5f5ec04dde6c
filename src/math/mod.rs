//! Mathematical utilities: simple linear regression and descriptive statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
