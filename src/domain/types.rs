//! Shared domain types.
//!
//! These types are intentionally small, immutable value objects so they can be:
//!
//! - produced by the fetchers and consumed by the pure analytics functions
//! - exported to CSV/JSON
//! - rebuilt from scratch on every request (no shared state between calls)

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::median;

/// Median gap (days) separating monthly-like from quarterly-like series.
pub const QUARTERLY_GAP_DAYS: f64 = 60.0;

/// Median gap assumed when a series has fewer than two points.
const DEFAULT_GAP_DAYS: f64 = 30.0;

/// Upstream data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Fred,
    Bls,
    Treasury,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Fred, Provider::Bls, Provider::Treasury];

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Fred => "FRED",
            Provider::Bls => "BLS",
            Provider::Treasury => "Treasury",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Selectable series.
///
/// The display name doubles as the aligned-table column header, so it is
/// what ends up in CSV exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKey {
    Gdp,
    Cpi,
    Unrate,
    Fedfunds,
    Ppi,
    Wages,
    Debt,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 7] = [
        SeriesKey::Gdp,
        SeriesKey::Cpi,
        SeriesKey::Unrate,
        SeriesKey::Fedfunds,
        SeriesKey::Ppi,
        SeriesKey::Wages,
        SeriesKey::Debt,
    ];

    pub fn provider(self) -> Provider {
        match self {
            SeriesKey::Gdp | SeriesKey::Cpi | SeriesKey::Unrate | SeriesKey::Fedfunds | SeriesKey::Ppi => {
                Provider::Fred
            }
            SeriesKey::Wages => Provider::Bls,
            SeriesKey::Debt => Provider::Treasury,
        }
    }

    /// Provider-side series identifier.
    pub fn series_id(self) -> &'static str {
        match self {
            SeriesKey::Gdp => "GDP",
            SeriesKey::Cpi => "CPIAUCSL",
            SeriesKey::Unrate => "UNRATE",
            SeriesKey::Fedfunds => "FEDFUNDS",
            SeriesKey::Ppi => "PPIACO",
            SeriesKey::Wages => "CES0500000003",
            SeriesKey::Debt => "debt_to_penny",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SeriesKey::Gdp => "GDP - Gross Domestic Product (Quarterly - Billions $)",
            SeriesKey::Cpi => "CPIAUCSL - Consumer Price Index (Monthly - Index)",
            SeriesKey::Unrate => "UNRATE - Unemployment Rate (Monthly - %)",
            SeriesKey::Fedfunds => "FEDFUNDS - Federal Funds Rate (Monthly - %)",
            SeriesKey::Ppi => "PPIACO - Producer Price Index (Monthly - Index)",
            SeriesKey::Wages => "BLS AHE Private - Average Hourly Earnings (Monthly - $)",
            SeriesKey::Debt => "Treasury Public Debt - Total Outstanding (Daily - Billions $)",
        }
    }
}

/// A single raw observation. `value` is `None` when the provider reports a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Observations for one provider series, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub series_id: String,
    pub observations: Vec<Observation>,
}

impl RawSeries {
    /// Build a series, sorting by date and keeping the last observation for a
    /// repeated date.
    pub fn new(series_id: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.date);
        let mut deduped: Vec<Observation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }
        Self {
            series_id: series_id.into(),
            observations: deduped,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// A raw series paired with the column name it will get in the aligned table.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesInput {
    pub name: String,
    pub raw: RawSeries,
}

impl SeriesInput {
    pub fn new(name: impl Into<String>, raw: RawSeries) -> Self {
        Self { name: name.into(), raw }
    }
}

/// One non-missing point of a single series, as consumed by the analytics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Inclusive calendar-year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn ordered(a: i32, b: i32) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date.year())
    }
}

/// Native sampling cadence inferred from the median gap between points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Monthly,
    Quarterly,
}

impl Cadence {
    /// Classify by median consecutive-day gap; `> 60` days is quarterly.
    ///
    /// The median (rather than the mean) keeps one missing month from flipping
    /// a monthly series to quarterly.
    pub fn detect(dates: &[NaiveDate]) -> Self {
        if median_gap_days(dates) > QUARTERLY_GAP_DAYS {
            Cadence::Quarterly
        } else {
            Cadence::Monthly
        }
    }

    /// Step used for forecast dates: monthly only below 60 days, so an exact
    /// 60-day gap steps by a quarter.
    pub fn detect_forecast_step(dates: &[NaiveDate]) -> Self {
        if median_gap_days(dates) < QUARTERLY_GAP_DAYS {
            Cadence::Monthly
        } else {
            Cadence::Quarterly
        }
    }

    /// Lag (in rows) used for the year-over-year comparison.
    pub fn yoy_shift(self) -> usize {
        match self {
            Cadence::Monthly => 12,
            Cadence::Quarterly => 4,
        }
    }

    /// Months between consecutive periods.
    pub fn step_months(self) -> u32 {
        match self {
            Cadence::Monthly => 1,
            Cadence::Quarterly => 3,
        }
    }

    pub fn pop_label(self) -> &'static str {
        match self {
            Cadence::Monthly => "MoM %",
            Cadence::Quarterly => "QoQ %",
        }
    }
}

/// Median consecutive-day gap, or 30 days with fewer than two dates.
pub fn median_gap_days(dates: &[NaiveDate]) -> f64 {
    let gaps: Vec<f64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect();
    median(&gaps).unwrap_or(DEFAULT_GAP_DAYS)
}

/// One row of the aligned table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    /// One entry per column, in column order.
    pub values: Vec<Option<f64>>,
}

/// Series merged onto a canonical month-end index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTable {
    pub columns: Vec<String>,
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Non-missing points of one column, in date order.
    ///
    /// Missing cells can only precede a series' first observation, so this
    /// drops the leading warm-up of the later-starting series.
    pub fn series(&self, column: usize) -> Vec<SeriesPoint> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.values
                    .get(column)
                    .copied()
                    .flatten()
                    .map(|v| SeriesPoint::new(row.date, v))
            })
            .collect()
    }

    /// Rows where every column has a value.
    pub fn complete_rows(&self) -> Vec<(NaiveDate, Vec<f64>)> {
        self.rows
            .iter()
            .filter_map(|row| {
                let values: Option<Vec<f64>> = row.values.iter().copied().collect();
                values.map(|v| (row.date, v))
            })
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Last calendar day of `date`'s month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

pub fn is_month_end(date: NaiveDate) -> bool {
    month_end(date) == date
}

/// Step `date` forward by `months`, keeping month-end dates on month-end.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let shifted = date.checked_add_months(Months::new(months))?;
    if is_month_end(date) {
        Some(month_end(shifted))
    } else {
        Some(shifted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_end_handles_leap_years() {
        assert_eq!(month_end(d(2024, 2, 3)), d(2024, 2, 29));
        assert_eq!(month_end(d(2023, 2, 28)), d(2023, 2, 28));
        assert_eq!(month_end(d(2025, 12, 1)), d(2025, 12, 31));
    }

    #[test]
    fn add_months_keeps_month_end() {
        assert_eq!(add_months(d(2024, 1, 31), 1), Some(d(2024, 2, 29)));
        assert_eq!(add_months(d(2024, 2, 29), 1), Some(d(2024, 3, 31)));
        assert_eq!(add_months(d(2024, 2, 10), 3), Some(d(2024, 5, 10)));
    }

    #[test]
    fn cadence_uses_median_gap() {
        let quarterly: Vec<NaiveDate> = (0..8).map(|i| d(2020, 1, 1) + chrono::Duration::days(91 * i)).collect();
        assert_eq!(Cadence::detect(&quarterly), Cadence::Quarterly);

        // One skipped month does not flip a monthly series.
        let mut monthly: Vec<NaiveDate> = (0..12).map(|i| d(2020, 1, 1) + chrono::Duration::days(30 * i)).collect();
        monthly.remove(5);
        assert_eq!(Cadence::detect(&monthly), Cadence::Monthly);

        assert_eq!(Cadence::detect(&[d(2020, 1, 1)]), Cadence::Monthly);
    }

    #[test]
    fn sixty_day_gap_is_monthly_for_changes_but_steps_quarterly() {
        let dates: Vec<NaiveDate> = (0..12).map(|i| d(2020, 1, 1) + chrono::Duration::days(60 * i)).collect();
        assert_eq!(median_gap_days(&dates), 60.0);
        assert_eq!(Cadence::detect(&dates), Cadence::Monthly);
        assert_eq!(Cadence::detect_forecast_step(&dates), Cadence::Quarterly);

        let under: Vec<NaiveDate> = (0..12).map(|i| d(2020, 1, 1) + chrono::Duration::days(59 * i)).collect();
        assert_eq!(Cadence::detect_forecast_step(&under), Cadence::Monthly);
        assert_eq!(Cadence::detect_forecast_step(&[d(2020, 1, 1)]), Cadence::Monthly);
    }

    #[test]
    fn raw_series_sorts_and_dedupes() {
        let raw = RawSeries::new(
            "X",
            vec![
                Observation::new(d(2020, 3, 1), Some(3.0)),
                Observation::new(d(2020, 1, 1), Some(1.0)),
                Observation::new(d(2020, 3, 1), Some(4.0)),
            ],
        );
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.observations[0].date, d(2020, 1, 1));
        assert_eq!(raw.observations[1].value, Some(4.0));
    }

    #[test]
    fn year_range_swaps_reversed_bounds() {
        let range = YearRange::ordered(2024, 2020);
        assert_eq!(range, YearRange { start: 2020, end: 2024 });
        assert!(range.contains(d(2022, 6, 30)));
        assert!(!range.contains(d(2025, 1, 1)));
    }

    #[test]
    fn aligned_table_series_skips_missing() {
        let table = AlignedTable {
            columns: vec!["a".into(), "b".into()],
            rows: vec![
                AlignedRow { date: d(2020, 1, 31), values: vec![Some(1.0), None] },
                AlignedRow { date: d(2020, 2, 29), values: vec![Some(2.0), Some(5.0)] },
            ],
        };
        assert_eq!(table.series(1), vec![SeriesPoint::new(d(2020, 2, 29), 5.0)]);
        assert_eq!(table.complete_rows().len(), 1);
        assert_eq!(table.column_index("b"), Some(1));
    }
}
