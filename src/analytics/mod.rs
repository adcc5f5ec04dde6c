//! Alignment and analytics.
//!
//! Every function here is pure and deterministic: no I/O, no shared state.
//! Expected edge cases (short windows, missing lags) come back as sentinels in
//! the result types; only structural failures (no data, too little history for
//! a forecast) are errors.

pub mod align;
pub mod anomaly;
pub mod changes;
pub mod cross;
pub mod forecast;
pub mod summary;
pub mod trend;

pub use align::align_series;
pub use anomaly::{AnomalyConfig, AnomalyRow, detect_anomalies};
pub use changes::{ChangeRow, ChangeTable, calculate_changes};
pub use cross::{LagCorrelation, PairAnalysis, analyze_pair};
pub use forecast::{Forecast, ForecastPoint, apply_shock, forecast_linear, forecast_with_shock};
pub use summary::{InsightSummary, SummaryInputs, summarize};
pub use trend::{TrendDirection, TrendResult, detect_trend};
