//! Export the aligned table (CSV) and the analysis results (JSON).
//!
//! The CSV is the aligned table as-is: `date` plus one column per series,
//! ISO dates, and an empty cell where a value is missing.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::analytics::{AnomalyRow, Forecast, InsightSummary, PairAnalysis, TrendResult};
use crate::domain::{AlignedTable, YearRange};
use crate::error::AppError;

/// Write the aligned table to a CSV file.
pub fn write_aligned_csv(path: &Path, table: &AlignedTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_aligned_csv_to(file, table)
}

/// Write the aligned table as CSV to any writer.
pub fn write_aligned_csv_to<W: Write>(writer: W, table: &AlignedTable) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| AppError::Io(format!("Failed to write export CSV: {e}"));

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push("date");
    header.extend(table.columns.iter().map(String::as_str));
    csv.write_record(&header).map_err(csv_err)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.extend(row.values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        csv.write_record(&record).map_err(csv_err)?;
    }

    csv.flush()
        .map_err(|e| AppError::Io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Machine-readable analysis results.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisExport<'a> {
    pub range: YearRange,
    pub summary: &'a InsightSummary,
    pub trend: &'a TrendResult,
    /// Flagged rows only.
    pub anomalies: Vec<&'a AnomalyRow>,
    pub forecast: Option<&'a Forecast>,
    /// Set when a forecast was requested but could not be produced.
    pub forecast_error: Option<String>,
    pub scenario: Option<&'a Forecast>,
    pub pair: Option<&'a PairAnalysis>,
}

pub fn write_analysis_json(path: &Path, export: &AnalysisExport<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::Io(format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{TrendDirection, detect_trend};
    use crate::domain::AlignedRow;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn table() -> AlignedTable {
        AlignedTable {
            columns: vec!["CPI".into(), "Wages, $/hr".into()],
            rows: vec![
                AlignedRow {
                    date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                    values: vec![Some(308.4), None],
                },
                AlignedRow {
                    date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                    values: vec![Some(310.3), Some(34.57)],
                },
            ],
        }
    }

    #[test]
    fn csv_layout() {
        let mut buf = Vec::new();
        write_aligned_csv_to(&mut buf, &table()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,CPI,\"Wages, $/hr\"");
        assert_eq!(lines[1], "2024-01-31,308.4,");
        assert_eq!(lines[2], "2024-02-29,310.3,34.57");
    }

    #[test]
    fn csv_file_round_trips_through_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aligned.csv");
        write_aligned_csv(&path, &table()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 3);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "");
    }

    #[test]
    fn json_export_contains_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.json");
        let t = table();
        let points = t.series(0);
        let trend = detect_trend(&points, 12);
        assert_eq!(trend.direction, TrendDirection::Upward);
        let summary = InsightSummary {
            series: t.columns.clone(),
            primary: "CPI".into(),
            latest_date: t.last_date(),
            latest_value: Some(310.3),
            yoy_pct: None,
            pop_pct: None,
            pop_label: "MoM %".into(),
            trend: trend.label(),
            anomaly_count: 0,
            recent_anomalies: 0,
            forecast_end: None,
            scenario_shock_pct: None,
            scenario_end: None,
            pair_note: None,
        };
        let export = AnalysisExport {
            range: YearRange::ordered(2024, 2024),
            summary: &summary,
            trend: &trend,
            anomalies: Vec::new(),
            forecast: None,
            forecast_error: Some("Insufficient history".into()),
            scenario: None,
            pair: None,
        };
        write_analysis_json(&path, &export).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["primary"], "CPI");
        assert_eq!(value["range"]["start"], 2024);
        assert!(value["forecast"].is_null());
        assert_eq!(value["forecast_error"], "Insufficient history");
    }
}
