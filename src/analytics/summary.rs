//! Compact numeric summary of the primary series.
//!
//! This is the grounding context handed to the narrative generator, and the
//! "current snapshot" printed by `mf insights`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::anomaly::{AnomalyRow, anomaly_count, recent_anomaly_count};
use crate::analytics::changes::ChangeTable;
use crate::analytics::cross::PairAnalysis;
use crate::analytics::forecast::Forecast;
use crate::analytics::trend::TrendResult;

/// Rows counted as "recent" for the anomaly summary.
pub const RECENT_PERIODS: usize = 12;

/// End point of a forecast trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryEnd {
    pub date: NaiveDate,
    pub yhat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub series: Vec<String>,
    pub primary: String,
    pub latest_date: Option<NaiveDate>,
    pub latest_value: Option<f64>,
    pub yoy_pct: Option<f64>,
    pub pop_pct: Option<f64>,
    pub pop_label: String,
    pub trend: String,
    pub anomaly_count: usize,
    pub recent_anomalies: usize,
    pub forecast_end: Option<TrajectoryEnd>,
    pub scenario_shock_pct: Option<f64>,
    pub scenario_end: Option<TrajectoryEnd>,
    /// One-line cross-series note, when two series are selected.
    pub pair_note: Option<String>,
}

/// Inputs borrowed from a finished analysis run.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInputs<'a> {
    pub series: &'a [String],
    pub changes: &'a ChangeTable,
    pub trend: &'a TrendResult,
    pub anomalies: &'a [AnomalyRow],
    pub forecast: Option<&'a Forecast>,
    pub scenario: Option<(f64, &'a Forecast)>,
    pub pair: Option<&'a PairAnalysis>,
}

pub fn summarize(inputs: SummaryInputs<'_>) -> InsightSummary {
    let latest = inputs.changes.latest();
    let end_of = |f: &Forecast| f.last().map(|p| TrajectoryEnd { date: p.date, yhat: p.yhat });

    InsightSummary {
        series: inputs.series.to_vec(),
        primary: inputs.series.first().cloned().unwrap_or_default(),
        latest_date: latest.map(|r| r.date),
        latest_value: latest.map(|r| r.value),
        yoy_pct: latest.and_then(|r| r.yoy_pct),
        pop_pct: latest.and_then(|r| r.pop_pct),
        pop_label: inputs.changes.pop_label().to_string(),
        trend: inputs.trend.label(),
        anomaly_count: anomaly_count(inputs.anomalies),
        recent_anomalies: recent_anomaly_count(inputs.anomalies, RECENT_PERIODS),
        forecast_end: inputs.forecast.and_then(end_of),
        scenario_shock_pct: inputs.scenario.map(|(pct, _)| pct),
        scenario_end: inputs.scenario.and_then(|(_, f)| end_of(f)),
        pair_note: inputs.pair.map(pair_note),
    }
}

impl InsightSummary {
    /// Single-paragraph context string for the narrative generator.
    pub fn to_context(&self) -> String {
        let mut out = format!("Series: {}.", self.series.join(", "));
        if let (Some(value), Some(date)) = (self.latest_value, self.latest_date) {
            out.push_str(&format!(" Latest primary: {value:.3} ({date})."));
        }
        out.push_str(&format!(" Trend: {}.", self.trend));
        out.push_str(&format!(" YoY: {}.", fmt_pct(self.yoy_pct)));
        out.push_str(&format!(" {}: {}.", self.pop_label, fmt_pct(self.pop_pct)));
        out.push_str(&format!(
            " Anomalies: {} ({} in last {RECENT_PERIODS} periods).",
            self.anomaly_count, self.recent_anomalies
        ));
        if let Some(end) = self.forecast_end {
            out.push_str(&format!(" Base trajectory to {:.2} by {}.", end.yhat, end.date));
        }
        if let (Some(pct), Some(end)) = (self.scenario_shock_pct, self.scenario_end) {
            out.push_str(&format!(
                " Scenario {pct:+.1}% shock to latest value: trajectory to {:.2} by {}.",
                end.yhat, end.date
            ));
        }
        if let Some(note) = &self.pair_note {
            out.push(' ');
            out.push_str(note);
        }
        out.push_str(" Data aligned monthly (month-end).");
        out
    }
}

pub fn fmt_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}%")).unwrap_or_else(|| "N/A".to_string())
}

fn fmt_r(r: Option<f64>) -> String {
    r.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string())
}

/// Short description of a pair analysis, e.g. `Overall corr r=0.97.`.
pub fn pair_note(pair: &PairAnalysis) -> String {
    match pair {
        PairAnalysis::General { correlation } => format!("Overall corr r={}.", fmt_r(*correlation)),
        PairAnalysis::WagesVsInflation { correlation, lags } => {
            let parts: Vec<String> = lags.iter().map(|l| format!("{:+}: r={}", l.lag, fmt_r(l.r))).collect();
            format!(
                "Wages vs CPI corr r={}. Lead/lag (wages leads by +k months): {}.",
                fmt_r(*correlation),
                parts.join(", ")
            )
        }
        PairAnalysis::DebtToGdp {
            latest_ratio, ratio_trend, ..
        } => match latest_ratio {
            Some(ratio) => format!("Latest Debt/GDP: {ratio:.1}% ({} trend).", ratio_trend.label()),
            None => "Debt/GDP unavailable (no overlapping rows).".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::anomaly::{AnomalyConfig, detect_anomalies};
    use crate::analytics::changes::calculate_changes;
    use crate::analytics::forecast::forecast_linear;
    use crate::analytics::trend::{DEFAULT_TREND_WINDOW, detect_trend};
    use crate::domain::{SeriesPoint, add_months};

    fn points(n: usize) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        (0..n)
            .map(|i| SeriesPoint::new(add_months(start, i as u32).unwrap(), 200.0 + 2.0 * i as f64))
            .collect()
    }

    #[test]
    fn summary_reports_latest_changes_and_trend() {
        let pts = points(24);
        let changes = calculate_changes(&pts);
        let trend = detect_trend(&pts, DEFAULT_TREND_WINDOW);
        let anomalies = detect_anomalies(&pts, &AnomalyConfig::default());
        let forecast = forecast_linear(&pts, 12).unwrap();
        let series = vec!["CPI".to_string()];

        let summary = summarize(SummaryInputs {
            series: &series,
            changes: &changes,
            trend: &trend,
            anomalies: &anomalies,
            forecast: Some(&forecast),
            scenario: None,
            pair: None,
        });

        assert_eq!(summary.primary, "CPI");
        assert_eq!(summary.latest_value, Some(246.0));
        // 246 vs 222 twelve months earlier.
        assert!((summary.yoy_pct.unwrap() - (246.0 / 222.0 - 1.0) * 100.0).abs() < 1e-9);
        assert_eq!(summary.pop_label, "MoM %");
        assert_eq!(summary.trend, "upward (R²=1.00)");
        assert_eq!(summary.anomaly_count, 0);

        let context = summary.to_context();
        assert!(context.contains("Series: CPI."));
        assert!(context.contains("Trend: upward"));
        assert!(context.contains("Base trajectory to 270.00"));
        assert!(!context.contains("Scenario"));
    }

    #[test]
    fn missing_changes_render_as_not_available() {
        let pts = points(3);
        let changes = calculate_changes(&pts);
        let trend = detect_trend(&pts, DEFAULT_TREND_WINDOW);
        let series = vec!["X".to_string()];
        let summary = summarize(SummaryInputs {
            series: &series,
            changes: &changes,
            trend: &trend,
            anomalies: &[],
            forecast: None,
            scenario: None,
            pair: None,
        });
        assert!(summary.yoy_pct.is_none());
        assert!(summary.to_context().contains("YoY: N/A."));
    }

    #[test]
    fn pair_note_formats_correlation() {
        let note = pair_note(&PairAnalysis::General { correlation: Some(0.456) });
        assert_eq!(note, "Overall corr r=0.46.");
    }
}
