//! Linear-trend forecast with a 95% prediction interval.
//!
//! Unlike the trend detector, the fit uses the *entire* supplied history: a
//! long-run extrapolation is better estimated from all of it.
//!
//! For future index `x_f` the band half-width is
//!
//! ```text
//! z * s * sqrt(1 + 1/n + (x_f - x̄)^2 / Σ(x_i - x̄)^2)
//! ```
//!
//! with `s` the residual standard error and `z = 1.96`. This is the
//! large-sample normal approximation, not a Student-t quantile, so bands are
//! somewhat too narrow for short histories.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::{Cadence, SeriesPoint, add_months};
use crate::error::AppError;
use crate::math::fit_trend;

/// Minimum history accepted by the forecaster.
pub const MIN_FORECAST_POINTS: usize = 12;

pub const DEFAULT_HORIZON: usize = 12;

/// Normal critical value for a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

/// Relative floor on the residual standard error.
///
/// Keeps the band strictly positive (and widening) for a perfectly linear
/// history, where the raw residual error is exactly zero.
const MIN_RELATIVE_STD_ERROR: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl ForecastPoint {
    pub fn band_width(&self) -> f64 {
        self.yhat_upper - self.yhat_lower
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub cadence: Cadence,
    pub slope: f64,
    pub intercept: f64,
    /// Residual standard error actually used for the band.
    pub std_error: f64,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn last(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }
}

/// Extrapolate an OLS fit of value vs. 0-based index `horizon` periods ahead.
pub fn forecast_linear(points: &[SeriesPoint], horizon: usize) -> Result<Forecast, AppError> {
    if points.len() < MIN_FORECAST_POINTS {
        return Err(AppError::InsufficientHistory {
            required: MIN_FORECAST_POINTS,
            actual: points.len(),
        });
    }
    if horizon == 0 {
        return Err(AppError::InvalidRequest("forecast horizon must be at least 1".to_string()));
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let fit = fit_trend(&values)
        .ok_or_else(|| AppError::InvalidRequest("series contains non-finite values".to_string()))?;

    let n = fit.n as f64;
    let scale = (values.iter().map(|v| v.abs()).sum::<f64>() / n).max(1.0);
    let std_error = fit.std_error.max(MIN_RELATIVE_STD_ERROR * scale);

    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    let cadence = Cadence::detect_forecast_step(&dates);
    let last_date = points[points.len() - 1].date;

    let mut out = Vec::with_capacity(horizon);
    for step in 1..=horizon {
        let x_f = n - 1.0 + step as f64;
        let yhat = fit.predict(x_f);
        let leverage = 1.0 + 1.0 / n + (x_f - fit.mean_x).powi(2) / fit.sxx;
        let half_width = Z_95 * std_error * leverage.sqrt();

        let months = cadence.step_months() * step as u32;
        let date = add_months(last_date, months).ok_or_else(|| {
            AppError::InvalidRequest(format!("forecast date overflow {months} months after {last_date}"))
        })?;

        out.push(ForecastPoint {
            date,
            yhat,
            yhat_lower: yhat - half_width,
            yhat_upper: yhat + half_width,
        });
    }

    debug!(
        n = fit.n,
        horizon,
        slope = fit.slope,
        std_error,
        cadence = ?cadence,
        "linear forecast"
    );

    Ok(Forecast {
        cadence,
        slope: fit.slope,
        intercept: fit.intercept,
        std_error,
        points: out,
    })
}

/// Copy of `points` with only the most recent value scaled by `1 + shock_pct/100`.
pub fn apply_shock(points: &[SeriesPoint], shock_pct: f64) -> Vec<SeriesPoint> {
    let mut shocked = points.to_vec();
    if let Some(last) = shocked.last_mut() {
        last.value *= 1.0 + shock_pct / 100.0;
    }
    shocked
}

/// Re-run the forecaster from scratch on a shocked history.
///
/// The shock moves the fitted slope as well as the level, which is why the
/// baseline output is never adjusted in place.
pub fn forecast_with_shock(points: &[SeriesPoint], horizon: usize, shock_pct: f64) -> Result<Forecast, AppError> {
    forecast_linear(&apply_shock(points, shock_pct), horizon)
}
