//! Rolling z-score anomaly flagging.
//!
//! Statistics at row `i` use rows `max(0, i - window + 1) ..= i` only, so a
//! flag never changes when later data arrives.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::SeriesPoint;
use crate::math::{mean, sample_std};

/// Rolling detector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyConfig {
    pub window: usize,
    /// Rows required before stats are defined.
    pub min_periods: usize,
    /// `|z|` above this is anomalous.
    pub threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: 36,
            min_periods: 12,
            threshold: 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyRow {
    pub date: NaiveDate,
    pub value: f64,
    pub rolling_mean: Option<f64>,
    pub rolling_std: Option<f64>,
    pub z_score: Option<f64>,
    pub anomaly: bool,
}

/// Flag outliers against a trailing window.
///
/// Rows inside the warm-up period, and rows whose window has zero spread,
/// get undefined stats and are never anomalous.
pub fn detect_anomalies(points: &[SeriesPoint], config: &AnomalyConfig) -> Vec<AnomalyRow> {
    let window = config.window.max(1);
    let min_periods = config.min_periods.max(1).min(window);
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            let (rolling_mean, rolling_std) = if slice.len() >= min_periods {
                (mean(slice), sample_std(slice))
            } else {
                (None, None)
            };

            let z_score = match (rolling_mean, rolling_std) {
                (Some(m), Some(s)) if s > 0.0 => Some((p.value - m) / s),
                _ => None,
            };

            AnomalyRow {
                date: p.date,
                value: p.value,
                rolling_mean,
                rolling_std,
                z_score,
                anomaly: z_score.is_some_and(|z| z.abs() > config.threshold),
            }
        })
        .collect()
}

pub fn anomaly_count(rows: &[AnomalyRow]) -> usize {
    rows.iter().filter(|r| r.anomaly).count()
}

/// Anomalies among the last `periods` rows.
pub fn recent_anomaly_count(rows: &[AnomalyRow], periods: usize) -> usize {
    let start = rows.len().saturating_sub(periods);
    anomaly_count(&rows[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::add_months;

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2018, 1, 31).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(add_months(start, i as u32).unwrap(), v))
            .collect()
    }

    fn wobble(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 }).collect()
    }

    #[test]
    fn warm_up_rows_have_no_stats() {
        let rows = detect_anomalies(&series(&wobble(20)), &AnomalyConfig::default());
        for row in &rows[..11] {
            assert!(row.rolling_mean.is_none());
            assert!(row.z_score.is_none());
            assert!(!row.anomaly);
        }
        assert!(rows[11].rolling_mean.is_some());
        assert!(rows[11].rolling_std.is_some());
    }

    #[test]
    fn spike_is_flagged() {
        let mut values = wobble(30);
        values[25] = 120.0;
        let rows = detect_anomalies(&series(&values), &AnomalyConfig::default());
        assert!(rows[25].anomaly, "z = {:?}", rows[25].z_score);
        assert!(rows[25].z_score.unwrap() > 2.5);
        assert_eq!(anomaly_count(&rows), 1);
        assert_eq!(recent_anomaly_count(&rows, 12), 1);
        assert_eq!(recent_anomaly_count(&rows, 4), 0);
    }

    #[test]
    fn window_limits_history_used() {
        let values: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let config = AnomalyConfig { window: 5, min_periods: 3, threshold: 2.5 };
        let rows = detect_anomalies(&series(&values), &config);
        // Row 39 averages rows 35..=39.
        assert_eq!(rows[39].rolling_mean, Some(37.0));
        assert!(rows[1].rolling_mean.is_none());
        assert_eq!(rows[2].rolling_mean, Some(1.0));
    }

    #[test]
    fn constant_window_is_not_anomalous() {
        let rows = detect_anomalies(&series(&[7.0; 15]), &AnomalyConfig::default());
        assert!(rows.iter().all(|r| !r.anomaly && r.z_score.is_none()));
        assert_eq!(rows[14].rolling_std, Some(0.0));
    }
}
