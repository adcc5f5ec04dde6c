//! `macro-fusion` library crate.
//!
//! The binary (`mf`) is a thin wrapper around this library so that:
//!
//! - fetchers and analytics are testable without spawning processes
//! - the pipeline can be driven with in-memory sources
//! - code stays easy to navigate as the project grows

pub mod analytics;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod narrative;
pub mod report;
