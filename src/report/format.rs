//! Formatted terminal output.
//!
//! Formatting lives here so the analytics stay free of presentation
//! concerns; every function returns a `String` and performs no I/O.

use clap::ValueEnum;

use crate::analytics::summary::{RECENT_PERIODS, fmt_pct};
use crate::analytics::{AnomalyRow, Forecast, InsightSummary, PairAnalysis};
use crate::domain::{AlignedTable, SeriesKey, YearRange};

const NAME_WIDTH: usize = 28;

/// Catalog of selectable series.
pub fn format_catalog() -> String {
    let mut out = String::new();
    out.push_str(&header_line(&format!("{:<10} {:<9} {:<15} {}", "key", "provider", "series id", "name")));
    out.push_str(&rule(&[10, 9, 15, 40]));
    for key in SeriesKey::ALL {
        out.push_str(&header_line(&format!(
            "{:<10} {:<9} {:<15} {}",
            key_name(key),
            key.provider().display_name(),
            key.series_id(),
            key.display_name()
        )));
    }
    out
}

/// The name `-s/--series` accepts for `key`.
pub fn key_name(key: SeriesKey) -> String {
    key.to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

/// Run banner: selected series, years and table size.
pub fn format_run_header(range: YearRange, table: &AlignedTable) -> String {
    let mut out = String::new();
    out.push_str("=== macro-fusion ===\n");
    for (idx, name) in table.columns.iter().enumerate() {
        let role = if idx == 0 { "primary" } else { "secondary" };
        out.push_str(&format!("{role:<9}: {name}\n"));
    }
    out.push_str(&format!("Years    : {}-{}\n", range.start, range.end));
    match (table.first_date(), table.last_date()) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Rows     : {} (month-end, {first} .. {last})\n", table.len()));
        }
        _ => out.push_str("Rows     : 0\n"),
    }
    out
}

/// The last `rows` rows of the aligned table.
pub fn format_table_preview(table: &AlignedTable, rows: usize) -> String {
    let mut out = String::new();
    let mut head = format!("{:<10}", "date");
    for name in &table.columns {
        head.push_str(&format!(" {:>width$}", truncate(name, NAME_WIDTH), width = NAME_WIDTH));
    }
    out.push_str(&header_line(&head));

    let mut widths = vec![10];
    widths.extend(std::iter::repeat_n(NAME_WIDTH, table.columns.len()));
    out.push_str(&rule(&widths));

    let start = table.len().saturating_sub(rows);
    for row in &table.rows[start..] {
        let mut line = row.date.to_string();
        for value in &row.values {
            let cell = value.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {cell:>width$}", width = NAME_WIDTH));
        }
        out.push_str(&header_line(&line));
    }
    out
}

pub fn format_summary(summary: &InsightSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Snapshot: {}\n", summary.primary));
    match (summary.latest_value, summary.latest_date) {
        (Some(v), Some(d)) => out.push_str(&format!("- latest     : {v:.3} ({d})\n")),
        _ => out.push_str("- latest     : N/A\n"),
    }
    out.push_str(&format!("- YoY        : {}\n", fmt_pct(summary.yoy_pct)));
    out.push_str(&format!("- {:<11}: {}\n", summary.pop_label, fmt_pct(summary.pop_pct)));
    out.push_str(&format!("- trend      : {}\n", summary.trend));
    out.push_str(&format!(
        "- anomalies  : {} total, {} in last {RECENT_PERIODS} periods\n",
        summary.anomaly_count, summary.recent_anomalies
    ));
    if let Some(end) = summary.forecast_end {
        out.push_str(&format!("- trajectory : {:.3} by {}\n", end.yhat, end.date));
    }
    if let (Some(pct), Some(end)) = (summary.scenario_shock_pct, summary.scenario_end) {
        out.push_str(&format!("- scenario   : {pct:+.1}% shock -> {:.3} by {}\n", end.yhat, end.date));
    }
    out
}

/// Flagged rows, most recent last, capped at `limit`.
pub fn format_anomalies(rows: &[AnomalyRow], limit: usize) -> String {
    let flagged: Vec<&AnomalyRow> = rows.iter().filter(|r| r.anomaly).collect();
    if flagged.is_empty() {
        return "Anomalies: none flagged.\n".to_string();
    }

    let mut out = format!("Anomalies ({} flagged):\n", flagged.len());
    out.push_str(&header_line(&format!(
        "{:<10} {:>12} {:>12} {:>10} {:>8}",
        "date", "value", "mean", "std", "z"
    )));
    out.push_str(&rule(&[10, 12, 12, 10, 8]));
    let start = flagged.len().saturating_sub(limit);
    for r in &flagged[start..] {
        out.push_str(&header_line(&format!(
            "{:<10} {:>12.3} {:>12} {:>10} {:>8}",
            r.date,
            r.value,
            fmt_opt(r.rolling_mean, 3),
            fmt_opt(r.rolling_std, 3),
            fmt_opt(r.z_score, 2),
        )));
    }
    out
}

/// Baseline forecast table, with the scenario path alongside when present.
pub fn format_forecast(base: &Forecast, scenario: Option<(f64, &Forecast)>) -> String {
    let mut out = format!(
        "Forecast ({} steps, {:?} cadence, slope {:+.4}/period, 95% band):\n",
        base.points.len(),
        base.cadence,
        base.slope
    );
    let mut head = format!("{:<10} {:>12} {:>12} {:>12}", "date", "yhat", "lower", "upper");
    let mut widths = vec![10, 12, 12, 12];
    if let Some((pct, _)) = scenario {
        head.push_str(&format!(" {:>14}", format!("shock {pct:+.1}%")));
        widths.push(14);
    }
    out.push_str(&header_line(&head));
    out.push_str(&rule(&widths));

    for (idx, p) in base.points.iter().enumerate() {
        let mut line = format!(
            "{:<10} {:>12.3} {:>12.3} {:>12.3}",
            p.date, p.yhat, p.yhat_lower, p.yhat_upper
        );
        if let Some((_, shocked)) = scenario {
            let cell = shocked
                .points
                .get(idx)
                .map(|s| format!("{:.3}", s.yhat))
                .unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {cell:>14}"));
        }
        out.push_str(&header_line(&line));
    }
    out
}

pub fn format_pair(pair: &PairAnalysis) -> String {
    match pair {
        PairAnalysis::General { correlation } => {
            format!("Cross-series: overall correlation r={}\n", fmt_opt(*correlation, 3))
        }
        PairAnalysis::WagesVsInflation { correlation, lags } => {
            let mut out = format!(
                "Wages vs inflation: overall correlation r={}\n",
                fmt_opt(*correlation, 3)
            );
            out.push_str("Lead/lag (positive: wages lead CPI by k months):\n");
            for l in lags {
                out.push_str(&format!("  {:+}: r={}\n", l.lag, fmt_opt(l.r, 3)));
            }
            out
        }
        PairAnalysis::DebtToGdp {
            ratio,
            latest_ratio,
            ratio_trend,
        } => match latest_ratio {
            Some(latest) => format!(
                "Debt/GDP: latest {latest:.1}% over {} overlapping rows, trend {}\n",
                ratio.len(),
                ratio_trend.label()
            ),
            None => "Debt/GDP: no overlapping rows.\n".to_string(),
        },
    }
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}")).unwrap_or_else(|| "n/a".to_string())
}

fn header_line(s: &str) -> String {
    format!("{}\n", s.trim_end())
}

fn rule(widths: &[usize]) -> String {
    let parts: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    format!("{}\n", parts.join(" "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnomalyConfig, LagCorrelation, detect_anomalies, forecast_linear, forecast_with_shock};
    use crate::domain::{AlignedRow, SeriesPoint, add_months};
    use chrono::NaiveDate;

    fn points(values: &[f64]) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(add_months(start, i as u32).unwrap(), v))
            .collect()
    }

    #[test]
    fn catalog_lists_every_key() {
        let text = format_catalog();
        assert_eq!(text.lines().count(), SeriesKey::ALL.len() + 2);
        assert!(text.contains("CES0500000003"));
        assert!(text.contains("debt_to_penny"));
    }

    #[test]
    fn catalog_names_parse_back_as_series() {
        assert_eq!(key_name(SeriesKey::Fedfunds), "fedfunds");
        for key in SeriesKey::ALL {
            let name = key_name(key);
            assert!(!name.is_empty());
            assert_eq!(SeriesKey::from_str(&name, false), Ok(key));
        }
    }

    #[test]
    fn preview_shows_trailing_rows_and_missing_cells() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let table = AlignedTable {
            columns: vec!["A very long column name that will not fit".into()],
            rows: (0..5)
                .map(|i| AlignedRow {
                    date: add_months(start, i).unwrap(),
                    values: vec![if i == 4 { None } else { Some(i as f64) }],
                })
                .collect(),
        };
        let text = format_table_preview(&table, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with('.'));
        assert!(lines[2].starts_with("2024-04-30"));
        assert!(lines[3].starts_with("2024-05-31") && lines[3].ends_with('-'));
    }

    #[test]
    fn anomalies_section_handles_none_and_some() {
        let quiet = detect_anomalies(&points(&[5.0; 20]), &AnomalyConfig::default());
        assert_eq!(format_anomalies(&quiet, 10), "Anomalies: none flagged.\n");

        let mut values: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        values.push(200.0);
        let rows = detect_anomalies(&points(&values), &AnomalyConfig::default());
        let text = format_anomalies(&rows, 10);
        assert!(text.starts_with("Anomalies (1 flagged):"));
        assert!(text.contains("2022-07-31"));
    }

    #[test]
    fn forecast_table_includes_scenario_column() {
        let pts = points(&(0..24).map(|i| 10.0 + i as f64).collect::<Vec<_>>());
        let base = forecast_linear(&pts, 3).unwrap();
        let shocked = forecast_with_shock(&pts, 3, 5.0).unwrap();
        let text = format_forecast(&base, Some((5.0, &shocked)));
        assert!(text.contains("shock +5.0%"));
        assert_eq!(text.lines().count(), 3 + 3);
    }

    #[test]
    fn pair_sections() {
        let general = format_pair(&PairAnalysis::General { correlation: None });
        assert!(general.contains("r=n/a"));

        let wages = format_pair(&PairAnalysis::WagesVsInflation {
            correlation: Some(0.9),
            lags: vec![LagCorrelation { lag: -1, r: Some(0.5) }, LagCorrelation { lag: 1, r: None }],
        });
        assert!(wages.contains("  -1: r=0.500"));
        assert!(wages.contains("  +1: r=n/a"));
    }

    #[test]
    fn truncation_keeps_width() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
