//! Temporal alignment onto a canonical month-end index.
//!
//! Given 1–2 raw series of arbitrary native frequency (daily Treasury debt,
//! monthly CPI, quarterly GDP), produce one table whose rows are the month-ends
//! spanning the earliest to the latest in-range observation.
//!
//! Each column is forward-filled from its own raw dates: the value at month-end
//! `d` is the latest raw value observed on or before `d`. Values are never
//! interpolated and never back-filled, so a later-starting series has leading
//! missing cells.
//!
//! The month-end normalization is deliberately lossy for daily series: only
//! the last observation at or before each month-end survives.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{AlignedRow, AlignedTable, SeriesInput, SeriesPoint, YearRange, add_months, month_end};
use crate::error::AppError;

/// Maximum number of series merged into one table.
pub const MAX_SERIES: usize = 2;

/// Align 1–2 raw series onto month-end dates within `range`.
pub fn align_series(inputs: &[SeriesInput], range: YearRange) -> Result<AlignedTable, AppError> {
    if inputs.is_empty() || inputs.len() > MAX_SERIES {
        return Err(AppError::InvalidRequest(format!(
            "expected 1-{MAX_SERIES} series, got {}",
            inputs.len()
        )));
    }

    // 1) Restrict to the requested years and drop gaps.
    let mut filtered: Vec<Vec<SeriesPoint>> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let points = filter_in_range(input, range);
        if points.is_empty() {
            return Err(AppError::NoDataInRange {
                start_year: range.start,
                end_year: range.end,
                detail: format!("'{}' has no observations in the requested years", input.name),
            });
        }
        filtered.push(points);
    }

    // 2) Canonical month-end index over the union of filtered dates.
    let (min_date, max_date) = date_bounds(&filtered).ok_or_else(|| AppError::NoDataInRange {
        start_year: range.start,
        end_year: range.end,
        detail: "no observations in the requested years".to_string(),
    })?;
    let index = month_end_index(min_date, max_date);

    // 3) Forward-fill each column onto the index.
    let columns: Vec<Vec<Option<f64>>> = filtered.iter().map(|points| forward_fill(points, &index)).collect();

    // 4) Assemble rows.
    let rows: Vec<AlignedRow> = index
        .iter()
        .enumerate()
        .map(|(i, &date)| AlignedRow {
            date,
            values: columns.iter().map(|col| col[i]).collect(),
        })
        .collect();

    let any_value = rows.iter().any(|r| r.values.iter().any(Option::is_some));
    if !any_value {
        return Err(AppError::NoDataInRange {
            start_year: range.start,
            end_year: range.end,
            detail: "no overlapping data after monthly alignment".to_string(),
        });
    }

    debug!(
        rows = rows.len(),
        columns = inputs.len(),
        first = %min_date,
        last = %max_date,
        "aligned series onto month-end index"
    );

    Ok(AlignedTable {
        columns: inputs.iter().map(|i| i.name.clone()).collect(),
        rows,
    })
}

fn filter_in_range(input: &SeriesInput, range: YearRange) -> Vec<SeriesPoint> {
    input
        .raw
        .observations
        .iter()
        .filter(|o| range.contains(o.date))
        .filter_map(|o| match o.value {
            Some(v) if v.is_finite() => Some(SeriesPoint::new(o.date, v)),
            _ => None,
        })
        .collect()
}

fn date_bounds(series: &[Vec<SeriesPoint>]) -> Option<(NaiveDate, NaiveDate)> {
    let dates = series.iter().flatten().map(|p| p.date);
    let min = dates.clone().min()?;
    let max = dates.max()?;
    Some((min, max))
}

/// Month-ends from `min`'s month through `max`'s month, inclusive.
pub fn month_end_index(min: NaiveDate, max: NaiveDate) -> Vec<NaiveDate> {
    let last = month_end(max);
    let mut out = Vec::new();
    let mut current = month_end(min);
    while current <= last {
        out.push(current);
        match add_months(current, 1) {
            Some(next) => current = next,
            None => break,
        }
    }
    out
}

/// Latest value at or before each index date; `None` before the first point.
///
/// `points` must be ascending by date.
fn forward_fill(points: &[SeriesPoint], index: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(index.len());
    let mut cursor = 0usize;
    let mut last: Option<f64> = None;
    for &date in index {
        while cursor < points.len() && points[cursor].date <= date {
            last = Some(points[cursor].value);
            cursor += 1;
        }
        out.push(last);
    }
    out
}
