//! Command-line parsing for the macro data explorer.
//!
//! Argument parsing and command dispatch stay separate from the fetch and
//! analytics code; `app` turns these structs into an `AnalysisRequest`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analytics::forecast::DEFAULT_HORIZON;
use crate::domain::SeriesKey;

pub const DEFAULT_START_YEAR: i32 = 2020;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mf", version, about = "Macro data fusion: FRED, BLS and Treasury series with analytics")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the selectable series.
    Series,
    /// Align one or two series and print changes, trend, anomalies and an optional forecast.
    Explore(ExploreArgs),
    /// Snapshot of the primary series plus cross-series analysis for a pair.
    Insights(InsightsArgs),
    /// Ask a question answered from the computed analytics.
    Ask(AskArgs),
}

/// Series selection shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct SelectionArgs {
    /// Series to analyze; repeat once for a second series (the first is primary).
    #[arg(short = 's', long = "series", value_enum, required = true)]
    pub series: Vec<SeriesKey>,

    /// First calendar year (inclusive).
    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    pub start: i32,

    /// Last calendar year (inclusive); defaults to the current year.
    #[arg(long)]
    pub end: Option<i32>,

    /// Ignore cached payloads and fetch live.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Project the primary series forward with a linear trend.
    #[arg(long)]
    pub forecast: bool,

    /// Forecast horizon in periods.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Scenario: shock the latest value by this percentage and re-forecast (implies --forecast).
    #[arg(long, allow_negative_numbers = true)]
    pub shock: Option<f64>,

    /// Aligned-table rows to print.
    #[arg(long, default_value_t = 12)]
    pub rows: usize,

    /// Flagged anomalies to print.
    #[arg(long, default_value_t = 10)]
    pub anomalies: usize,

    /// Export the aligned table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the analysis (summary, trend, forecast) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Append generated commentary on the trajectory (requires GOOGLE_API_KEY).
    #[arg(long)]
    pub narrate: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct InsightsArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Append a generated commentary (requires GOOGLE_API_KEY).
    #[arg(long)]
    pub narrate: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct AskArgs {
    /// The question, e.g. "Are wages keeping up with inflation?".
    pub question: String,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Rewrite argv so bare `mf` lists series and `mf -s cpi ...` means `mf explore -s cpi ...`.
///
/// Leading `-v/--verbose` flags are skipped before deciding, so they may come
/// first in either form.
///
/// Rules:
/// - `mf` / `mf -v`           -> `mf series` / `mf series -v`
/// - `mf -s cpi ...`          -> `mf explore -s cpi ...`
/// - `mf -v -s cpi ...`       -> `mf explore -v -s cpi ...`
/// - `mf --help/--version/-h` -> unchanged
pub fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let first = argv
        .iter()
        .skip(1)
        .find(|a| !is_global_flag(a))
        .cloned();
    let Some(first) = first else {
        argv.insert(1.min(argv.len()), "series".to_string());
        return argv;
    };

    let is_top_level = matches!(first.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(first.as_str(), "series" | "explore" | "insights" | "ask");
    if is_top_level || is_subcommand {
        return argv;
    }

    if first.starts_with('-') {
        argv.insert(1, "explore".to_string());
    }
    argv
}

fn is_global_flag(arg: &str) -> bool {
    matches!(arg, "-v" | "--verbose")
}
