//! Cross-series analysis for a selected pair.
//!
//! The pair kind is resolved once from the selected catalog keys:
//!
//! - wages + CPI: overall correlation plus a lead/lag correlation table
//! - Treasury debt + GDP: debt-to-GDP ratio and its recent trend
//! - anything else: overall correlation only
//!
//! All statistics use only rows where both columns have a value.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::trend::{DEFAULT_TREND_WINDOW, TrendResult, detect_trend};
use crate::domain::{AlignedTable, SeriesKey, SeriesPoint};
use crate::math::pearson;

/// Largest lead/lag (in rows) in the lag table.
pub const MAX_LAG: i32 = 3;

/// Correlation of `a[t]` with `b[t + lag]`.
///
/// A positive lag means the first series leads the second by `lag` periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LagCorrelation {
    pub lag: i32,
    pub r: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairAnalysis {
    WagesVsInflation {
        correlation: Option<f64>,
        lags: Vec<LagCorrelation>,
    },
    DebtToGdp {
        /// Debt as a percentage of GDP, per complete row.
        ratio: Vec<SeriesPoint>,
        latest_ratio: Option<f64>,
        ratio_trend: TrendResult,
    },
    General {
        correlation: Option<f64>,
    },
}

impl PairAnalysis {
    pub fn correlation(&self) -> Option<f64> {
        match self {
            PairAnalysis::WagesVsInflation { correlation, .. } | PairAnalysis::General { correlation } => *correlation,
            PairAnalysis::DebtToGdp { .. } => None,
        }
    }
}

/// Analyze the two columns of `table`, keyed by the catalog entries they came from.
///
/// Returns `None` unless the table has exactly two columns.
pub fn analyze_pair(table: &AlignedTable, keys: [SeriesKey; 2]) -> Option<PairAnalysis> {
    if table.columns.len() != 2 {
        return None;
    }
    let rows = table.complete_rows();
    let a: Vec<f64> = rows.iter().map(|(_, v)| v[0]).collect();
    let b: Vec<f64> = rows.iter().map(|(_, v)| v[1]).collect();

    let analysis = match keys {
        [SeriesKey::Wages, SeriesKey::Cpi] => PairAnalysis::WagesVsInflation {
            correlation: pearson(&a, &b),
            lags: lagged_correlations(&a, &b, MAX_LAG),
        },
        [SeriesKey::Cpi, SeriesKey::Wages] => PairAnalysis::WagesVsInflation {
            correlation: pearson(&b, &a),
            lags: lagged_correlations(&b, &a, MAX_LAG),
        },
        [SeriesKey::Debt, SeriesKey::Gdp] => debt_to_gdp(&rows, 0, 1),
        [SeriesKey::Gdp, SeriesKey::Debt] => debt_to_gdp(&rows, 1, 0),
        _ => PairAnalysis::General {
            correlation: pearson(&a, &b),
        },
    };
    Some(analysis)
}

/// Correlations for every lag in `-max_lag ..= max_lag`.
pub fn lagged_correlations(a: &[f64], b: &[f64], max_lag: i32) -> Vec<LagCorrelation> {
    (-max_lag..=max_lag)
        .map(|lag| LagCorrelation {
            lag,
            r: lagged_correlation(a, b, lag),
        })
        .collect()
}

fn lagged_correlation(a: &[f64], b: &[f64], lag: i32) -> Option<f64> {
    let n = a.len().min(b.len());
    let shift = lag.unsigned_abs() as usize;
    if shift >= n {
        return None;
    }
    let (xs, ys) = if lag >= 0 {
        (&a[..n - shift], &b[shift..n])
    } else {
        (&a[shift..n], &b[..n - shift])
    };
    pearson(xs, ys)
}

fn debt_to_gdp(rows: &[(NaiveDate, Vec<f64>)], debt_col: usize, gdp_col: usize) -> PairAnalysis {
    let ratio: Vec<SeriesPoint> = rows
        .iter()
        .filter_map(|(date, v)| {
            let pct = v[debt_col] / v[gdp_col] * 100.0;
            pct.is_finite().then(|| SeriesPoint::new(*date, pct))
        })
        .collect();
    let latest_ratio = ratio.last().map(|p| p.value);
    let ratio_trend = detect_trend(&ratio, DEFAULT_TREND_WINDOW);
    PairAnalysis::DebtToGdp {
        ratio,
        latest_ratio,
        ratio_trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trend::TrendDirection;
    use crate::domain::{AlignedRow, add_months};

    fn table(a: &[Option<f64>], b: &[Option<f64>]) -> AlignedTable {
        let start = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        AlignedTable {
            columns: vec!["a".into(), "b".into()],
            rows: a
                .iter()
                .zip(b.iter())
                .enumerate()
                .map(|(i, (&x, &y))| AlignedRow {
                    date: add_months(start, i as u32).unwrap(),
                    values: vec![x, y],
                })
                .collect(),
        }
    }

    #[test]
    fn lag_table_peaks_at_the_true_lead() {
        // b follows a with a two-period delay.
        let a: Vec<f64> = (0..30).map(|i| ((i * i) % 7) as f64).collect();
        let b: Vec<f64> = (0..30).map(|i| if i >= 2 { a[i - 2] } else { 0.0 }).collect();
        let lags = lagged_correlations(&a, &b, MAX_LAG);
        assert_eq!(lags.len(), 7);
        let best = lags
            .iter()
            .filter_map(|l| l.r.map(|r| (l.lag, r)))
            .max_by(|x, y| x.1.total_cmp(&y.1))
            .unwrap();
        assert_eq!(best.0, 2);
        assert!((best.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wages_and_cpi_get_lag_analysis_in_either_order() {
        let a: Vec<Option<f64>> = (0..20).map(|i| Some(25.0 + 0.1 * i as f64)).collect();
        let b: Vec<Option<f64>> = (0..20).map(|i| Some(300.0 + 0.7 * i as f64 + (i % 3) as f64)).collect();
        let t = table(&a, &b);

        let forward = analyze_pair(&t, [SeriesKey::Wages, SeriesKey::Cpi]).unwrap();
        let reversed = analyze_pair(&t, [SeriesKey::Cpi, SeriesKey::Wages]).unwrap();
        match (&forward, &reversed) {
            (
                PairAnalysis::WagesVsInflation { correlation: c1, lags: l1 },
                PairAnalysis::WagesVsInflation { correlation: c2, lags: l2 },
            ) => {
                assert!((c1.unwrap() - c2.unwrap()).abs() < 1e-12);
                assert_eq!(l1.len(), 7);
                assert_eq!(l2.len(), 7);
            }
            other => panic!("unexpected analysis: {other:?}"),
        }
    }

    #[test]
    fn debt_to_gdp_uses_complete_rows_only() {
        let debt = [Some(200.0), Some(210.0), Some(220.0), Some(230.0)];
        let gdp = [None, Some(100.0), Some(100.0), Some(100.0)];
        let t = table(&debt, &gdp);
        match analyze_pair(&t, [SeriesKey::Debt, SeriesKey::Gdp]).unwrap() {
            PairAnalysis::DebtToGdp { ratio, latest_ratio, ratio_trend } => {
                assert_eq!(ratio.len(), 3);
                assert_eq!(latest_ratio, Some(230.0));
                assert_eq!(ratio_trend.direction, TrendDirection::Upward);
            }
            other => panic!("unexpected analysis: {other:?}"),
        }
    }

    #[test]
    fn other_pairs_get_plain_correlation() {
        let a: Vec<Option<f64>> = (0..5).map(|i| Some(i as f64)).collect();
        let b: Vec<Option<f64>> = (0..5).map(|i| Some(10.0 - i as f64)).collect();
        let analysis = analyze_pair(&table(&a, &b), [SeriesKey::Unrate, SeriesKey::Fedfunds]).unwrap();
        assert!((analysis.correlation().unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_column_tables_are_skipped() {
        let t = AlignedTable { columns: vec!["a".into()], rows: vec![] };
        assert!(analyze_pair(&t, [SeriesKey::Gdp, SeriesKey::Cpi]).is_none());
    }
}
