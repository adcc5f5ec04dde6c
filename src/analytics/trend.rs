//! Recent-momentum trend detection.
//!
//! The fit covers only the trailing window, not the full history: pricing
//! decisions react to the recent direction of a series.

use std::fmt;

use serde::Serialize;

use crate::domain::SeriesPoint;
use crate::math::fit_trend;

pub const DEFAULT_TREND_WINDOW: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Upward,
    Downward,
    Flat,
    /// Fewer than two points in the window.
    InsufficientData,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Upward => "upward",
            TrendDirection::Downward => "downward",
            TrendDirection::Flat => "flat",
            TrendDirection::InsufficientData => "Insufficient data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    /// R² of the trailing fit; `None` for insufficient data.
    pub strength: Option<f64>,
    pub slope: f64,
    /// Points actually used.
    pub window: usize,
}

impl TrendResult {
    fn insufficient(window: usize) -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            strength: None,
            slope: 0.0,
            window,
        }
    }

    /// e.g. `upward (R²=0.93)`.
    pub fn label(&self) -> String {
        match self.strength {
            Some(r2) => format!("{} (R²={r2:.2})", self.direction.as_str()),
            None => self.direction.as_str().to_string(),
        }
    }
}

impl fmt::Display for TrendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Fit value against a 0-based index over the last `window` points.
pub fn detect_trend(points: &[SeriesPoint], window: usize) -> TrendResult {
    let start = points.len().saturating_sub(window);
    let recent: Vec<f64> = points[start..].iter().map(|p| p.value).collect();
    if recent.len() < 2 {
        return TrendResult::insufficient(recent.len());
    }

    let Some(fit) = fit_trend(&recent) else {
        return TrendResult::insufficient(recent.len());
    };

    let direction = if fit.slope > 0.0 {
        TrendDirection::Upward
    } else if fit.slope < 0.0 {
        TrendDirection::Downward
    } else {
        TrendDirection::Flat
    };

    TrendResult {
        direction,
        strength: Some(fit.r_squared),
        slope: fit.slope,
        window: recent.len(),
    }
}
