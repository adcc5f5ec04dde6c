//! Year-over-year and period-over-period percentage change.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Cadence, SeriesPoint};

/// One row enriched with lagged values and percentage changes.
///
/// Lag columns are `None` for the first `yoy_shift` / `1` rows by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeRow {
    pub date: NaiveDate,
    pub value: f64,
    pub value_lag_yoy: Option<f64>,
    pub yoy_pct: Option<f64>,
    pub value_lag_pop: Option<f64>,
    pub pop_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeTable {
    pub cadence: Cadence,
    pub rows: Vec<ChangeRow>,
}

impl ChangeTable {
    /// "MoM %" or "QoQ %".
    pub fn pop_label(&self) -> &'static str {
        self.cadence.pop_label()
    }

    pub fn yoy_shift(&self) -> usize {
        self.cadence.yoy_shift()
    }

    pub fn latest(&self) -> Option<&ChangeRow> {
        self.rows.last()
    }
}

/// Derive YoY and PoP changes, choosing the YoY lag from the detected cadence.
pub fn calculate_changes(points: &[SeriesPoint]) -> ChangeTable {
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    let cadence = Cadence::detect(&dates);
    let yoy_shift = cadence.yoy_shift();

    let rows = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let value_lag_yoy = i.checked_sub(yoy_shift).map(|j| points[j].value);
            let value_lag_pop = i.checked_sub(1).map(|j| points[j].value);
            ChangeRow {
                date: p.date,
                value: p.value,
                value_lag_yoy,
                yoy_pct: value_lag_yoy.and_then(|lag| pct_change(p.value, lag)),
                value_lag_pop,
                pop_pct: value_lag_pop.and_then(|lag| pct_change(p.value, lag)),
            }
        })
        .collect();

    ChangeTable { cadence, rows }
}

/// `(value / lag - 1) * 100`, or `None` when the ratio is undefined.
fn pct_change(value: f64, lag: f64) -> Option<f64> {
    let pct = (value / lag - 1.0) * 100.0;
    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn spaced(days: i64, n: usize) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        (0..n)
            .map(|i| SeriesPoint::new(start + Duration::days(days * i as i64), 100.0 + i as f64))
            .collect()
    }

    #[test]
    fn quarterly_spacing_uses_four_step_lag() {
        let table = calculate_changes(&spaced(91, 10));
        assert_eq!(table.cadence, Cadence::Quarterly);
        assert_eq!(table.yoy_shift(), 4);
        assert_eq!(table.pop_label(), "QoQ %");
        assert!(table.rows[3].value_lag_yoy.is_none());
        assert_eq!(table.rows[4].value_lag_yoy, Some(100.0));
        assert!((table.rows[4].yoy_pct.unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn monthly_spacing_uses_twelve_step_lag() {
        let table = calculate_changes(&spaced(30, 14));
        assert_eq!(table.cadence, Cadence::Monthly);
        assert_eq!(table.yoy_shift(), 12);
        assert_eq!(table.pop_label(), "MoM %");
        assert!(table.rows[11].yoy_pct.is_none());
        assert_eq!(table.rows[12].value_lag_yoy, Some(100.0));
        assert!((table.rows[12].yoy_pct.unwrap() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn period_over_period_is_always_one_step() {
        let table = calculate_changes(&spaced(91, 3));
        assert!(table.rows[0].value_lag_pop.is_none());
        assert!(table.rows[0].pop_pct.is_none());
        assert_eq!(table.rows[1].value_lag_pop, Some(100.0));
        assert!((table.rows[1].pop_pct.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_lag_yields_missing_percentage() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        let points = vec![SeriesPoint::new(start, 0.0), SeriesPoint::new(start + Duration::days(29), 1.5)];
        let table = calculate_changes(&points);
        assert_eq!(table.rows[1].value_lag_pop, Some(0.0));
        assert!(table.rows[1].pop_pct.is_none());
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = calculate_changes(&[]);
        assert!(table.rows.is_empty());
        assert_eq!(table.cadence, Cadence::Monthly);
        assert!(table.latest().is_none());
    }
}
