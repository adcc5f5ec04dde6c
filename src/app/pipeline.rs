//! Shared analysis pipeline used by every analysis command.
//!
//! Keeping the workflow in one place avoids duplicating it per command:
//! fetch -> align -> changes/trend/anomalies -> forecast/scenario -> pair -> summary
//!
//! The commands then only decide what to print or export.

use tracing::{debug, info, warn};

use crate::analytics::{
    AnomalyConfig, AnomalyRow, ChangeTable, Forecast, InsightSummary, PairAnalysis, SummaryInputs, TrendResult,
    align_series, analyze_pair, calculate_changes, detect_anomalies, detect_trend, forecast_linear,
    forecast_with_shock, summarize,
};
use crate::analytics::trend::DEFAULT_TREND_WINDOW;
use crate::analytics::align::MAX_SERIES;
use crate::data::Sources;
use crate::domain::{AlignedTable, SeriesInput, SeriesKey, SeriesPoint, YearRange};
use crate::error::AppError;
use crate::io::AnalysisExport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRequest {
    pub horizon: usize,
    /// Percentage shock applied to the latest value for a scenario run.
    pub shock_pct: Option<f64>,
}

/// Everything needed to run one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// One or two series; the first is primary.
    pub series: Vec<SeriesKey>,
    pub range: YearRange,
    pub force_refresh: bool,
    pub forecast: Option<ForecastRequest>,
    pub anomaly: AnomalyConfig,
    pub trend_window: usize,
}

impl AnalysisRequest {
    pub fn new(series: Vec<SeriesKey>, range: YearRange) -> Self {
        Self {
            series,
            range,
            force_refresh: false,
            forecast: None,
            anomaly: AnomalyConfig::default(),
            trend_window: DEFAULT_TREND_WINDOW,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.series.is_empty() || self.series.len() > MAX_SERIES {
            return Err(AppError::InvalidRequest(format!(
                "select 1 or {MAX_SERIES} series, got {}",
                self.series.len()
            )));
        }
        if self.series.len() == 2 && self.series[0] == self.series[1] {
            return Err(AppError::InvalidRequest("the two selected series must differ".to_string()));
        }
        if let Some(fc) = &self.forecast {
            if fc.horizon == 0 {
                return Err(AppError::InvalidRequest("forecast horizon must be at least 1".to_string()));
            }
        }
        Ok(())
    }
}

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub table: AlignedTable,
    /// Primary column of the aligned table.
    pub primary: Vec<SeriesPoint>,
    pub changes: ChangeTable,
    pub trend: TrendResult,
    pub anomalies: Vec<AnomalyRow>,
    /// `None` when no forecast was requested. An error here is fatal to the
    /// forecast only.
    pub forecast: Option<Result<Forecast, AppError>>,
    /// Shock percentage and the re-run forecast.
    pub scenario: Option<(f64, Forecast)>,
    pub pair: Option<PairAnalysis>,
    pub summary: InsightSummary,
}

impl AnalysisOutput {
    pub fn forecast_ok(&self) -> Option<&Forecast> {
        self.forecast.as_ref().and_then(|r| r.as_ref().ok())
    }

    pub fn forecast_err(&self) -> Option<&AppError> {
        self.forecast.as_ref().and_then(|r| r.as_ref().err())
    }

    pub fn to_export(&self, range: YearRange) -> AnalysisExport<'_> {
        AnalysisExport {
            range,
            summary: &self.summary,
            trend: &self.trend,
            anomalies: self.anomalies.iter().filter(|r| r.anomaly).collect(),
            forecast: self.forecast_ok(),
            forecast_error: self.forecast_err().map(|e| e.to_string()),
            scenario: self.scenario.as_ref().map(|(_, f)| f),
            pair: self.pair.as_ref(),
        }
    }
}

/// Fetch every selected series, in order.
pub fn fetch_inputs(request: &AnalysisRequest, sources: &Sources) -> Result<Vec<SeriesInput>, AppError> {
    request.validate()?;
    let mut inputs = Vec::with_capacity(request.series.len());
    for &key in &request.series {
        info!(series = key.series_id(), provider = %key.provider(), "fetching");
        let raw = sources.fetch(key, request.force_refresh)?;
        debug!(series = key.series_id(), n = raw.len(), "fetched");
        inputs.push(SeriesInput::new(key.display_name(), raw));
    }
    Ok(inputs)
}

/// Run the analytics on already-fetched inputs.
pub fn analyze(request: &AnalysisRequest, inputs: &[SeriesInput]) -> Result<AnalysisOutput, AppError> {
    request.validate()?;
    let table = align_series(inputs, request.range)?;
    let primary = table.series(0);

    let changes = calculate_changes(&primary);
    let trend = detect_trend(&primary, request.trend_window);
    let anomalies = detect_anomalies(&primary, &request.anomaly);

    let forecast = request.forecast.map(|fc| forecast_linear(&primary, fc.horizon));
    if let Some(Err(err)) = &forecast {
        warn!(error = %err, "forecast skipped");
    }

    let scenario = match (request.forecast, &forecast) {
        (Some(ForecastRequest { horizon, shock_pct: Some(pct) }), Some(Ok(_))) => {
            forecast_with_shock(&primary, horizon, pct).ok().map(|f| (pct, f))
        }
        _ => None,
    };

    let pair = match request.series.as_slice() {
        [a, b] => analyze_pair(&table, [*a, *b]),
        _ => None,
    };

    let summary = summarize(SummaryInputs {
        series: &table.columns,
        changes: &changes,
        trend: &trend,
        anomalies: &anomalies,
        forecast: forecast.as_ref().and_then(|r| r.as_ref().ok()),
        scenario: scenario.as_ref().map(|(pct, f)| (*pct, f)),
        pair: pair.as_ref(),
    });

    info!(
        rows = table.len(),
        trend = %trend,
        anomalies = summary.anomaly_count,
        "analysis complete"
    );

    Ok(AnalysisOutput {
        table,
        primary,
        changes,
        trend,
        anomalies,
        forecast,
        scenario,
        pair,
        summary,
    })
}

/// Fetch and analyze in one call.
pub fn run_analysis(request: &AnalysisRequest, sources: &Sources) -> Result<AnalysisOutput, AppError> {
    let inputs = fetch_inputs(request, sources)?;
    analyze(request, &inputs)
}
