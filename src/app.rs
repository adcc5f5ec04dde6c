//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds an `AnalysisRequest` from the selection flags
//! - runs the fetch + analytics pipeline
//! - prints reports and writes optional exports
//! - asks the narrative generator when requested

use chrono::{Datelike, Local};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::analytics::forecast::DEFAULT_HORIZON;
use crate::cli::{AskArgs, Cli, Command, ExploreArgs, InsightsArgs, SelectionArgs, rewrite_args};
use crate::config::Settings;
use crate::data::Sources;
use crate::domain::YearRange;
use crate::error::AppError;
use crate::narrative::{ContextRetriever, GeminiClient, NarrativeRequest, explain};
use crate::report;

pub mod pipeline;

use pipeline::{AnalysisOutput, AnalysisRequest, ForecastRequest};

const FORECAST_QUESTION: &str =
    "Summarize business/pricing strategy implications of this forecast/scenario trajectory in concise bullets.";
const INSIGHTS_QUESTION: &str =
    "Summarize the key business and pricing insights from these indicators and their relationship in concise bullets.";

/// Entry point for the `mf` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Series => {
            print!("{}", report::format_catalog());
            Ok(())
        }
        Command::Explore(args) => handle_explore(args),
        Command::Insights(args) => handle_insights(args),
        Command::Ask(args) => handle_ask(args),
    }
}

/// Priority: RUST_LOG > --verbose (debug) > warn. Logs go to stderr so stdout
/// carries only the report.
fn init_tracing(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();
}

fn handle_explore(args: ExploreArgs) -> Result<(), AppError> {
    let settings = Settings::from_env()?;
    let generator = args.narrate.then(|| GeminiClient::from_settings(&settings)).transpose()?;
    let sources = Sources::from_settings(&settings)?;

    let mut request = request_from_selection(&args.selection, current_year());
    if args.forecast || args.shock.is_some() {
        request.forecast = Some(ForecastRequest {
            horizon: args.horizon,
            shock_pct: args.shock,
        });
    }
    let run = pipeline::run_analysis(&request, &sources)?;

    println!("{}", report::format_run_header(request.range, &run.table));
    println!("{}", report::format_table_preview(&run.table, args.rows));
    println!("{}", report::format_summary(&run.summary));
    println!("{}", report::format_anomalies(&run.anomalies, args.anomalies));
    print_forecast(&run);
    if let Some(pair) = &run.pair {
        println!("{}", report::format_pair(pair));
    }

    if let Some(path) = &args.export {
        crate::io::write_aligned_csv(path, &run.table)?;
        println!("Wrote aligned table to {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::write_analysis_json(path, &run.to_export(request.range))?;
        println!("Wrote analysis to {}", path.display());
    }

    if let Some(generator) = &generator {
        print_narrative(generator, FORECAST_QUESTION, &run);
    }
    Ok(())
}

fn handle_insights(args: InsightsArgs) -> Result<(), AppError> {
    let settings = Settings::from_env()?;
    let generator = args.narrate.then(|| GeminiClient::from_settings(&settings)).transpose()?;
    let sources = Sources::from_settings(&settings)?;

    let mut request = request_from_selection(&args.selection, current_year());
    request.forecast = Some(ForecastRequest {
        horizon: DEFAULT_HORIZON,
        shock_pct: None,
    });
    let run = pipeline::run_analysis(&request, &sources)?;

    println!("{}", report::format_run_header(request.range, &run.table));
    println!("{}", report::format_summary(&run.summary));
    match &run.pair {
        Some(pair) => println!("{}", report::format_pair(pair)),
        None => println!("Select two series (-s a -s b) for cross-series analysis.\n"),
    }

    if let Some(generator) = &generator {
        print_narrative(generator, INSIGHTS_QUESTION, &run);
    }
    Ok(())
}

fn handle_ask(args: AskArgs) -> Result<(), AppError> {
    if args.question.trim().is_empty() {
        return Err(AppError::InvalidRequest("the question is empty".to_string()));
    }
    let settings = Settings::from_env()?;
    let generator = GeminiClient::from_settings(&settings)?;
    let sources = Sources::from_settings(&settings)?;

    let request = request_from_selection(&args.selection, current_year());
    let run = pipeline::run_analysis(&request, &sources)?;

    println!("{}", report::format_summary(&run.summary));
    print_narrative(&generator, &args.question, &run);
    Ok(())
}

fn print_forecast(run: &AnalysisOutput) {
    match &run.forecast {
        Some(Ok(forecast)) => {
            let scenario = run.scenario.as_ref().map(|(pct, f)| (*pct, f));
            println!("{}", report::format_forecast(forecast, scenario));
        }
        Some(Err(err)) => println!("Forecast unavailable: {err}\n"),
        None => {}
    }
}

fn print_narrative(generator: &GeminiClient, question: &str, run: &AnalysisOutput) {
    let context = run.summary.to_context();
    let narrative = explain(
        generator,
        &ContextRetriever::curated(),
        NarrativeRequest {
            question,
            data_context: &context,
            summary: Some(&run.summary),
            table: Some(&run.table),
        },
    );
    if narrative.is_failed() {
        println!("Narrative generation failed:");
    } else {
        println!("Narrative ({}):", generator.model());
    }
    println!("{narrative}");
}

fn current_year() -> i32 {
    Local::now().year()
}

/// Build a request from the selection flags, swapping reversed years.
pub fn request_from_selection(selection: &SelectionArgs, current_year: i32) -> AnalysisRequest {
    let end = selection.end.unwrap_or(current_year);
    if selection.start > end {
        warn!(start = selection.start, end, "start year after end year, swapping");
    }
    let mut request = AnalysisRequest::new(selection.series.clone(), YearRange::ordered(selection.start, end));
    request.force_refresh = selection.refresh;
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesKey;

    fn selection(start: i32, end: Option<i32>) -> SelectionArgs {
        SelectionArgs {
            series: vec![SeriesKey::Cpi],
            start,
            end,
            refresh: true,
        }
    }

    #[test]
    fn end_defaults_to_current_year() {
        let request = request_from_selection(&selection(2020, None), 2026);
        assert_eq!(request.range, YearRange { start: 2020, end: 2026 });
        assert!(request.force_refresh);
        assert!(request.forecast.is_none());
    }

    #[test]
    fn reversed_years_are_swapped() {
        let request = request_from_selection(&selection(2024, Some(2019)), 2026);
        assert_eq!(request.range, YearRange { start: 2019, end: 2024 });
    }
}
