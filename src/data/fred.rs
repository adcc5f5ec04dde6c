//! FRED series observations.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::data::cache::{DiskCache, fred_cache_name};
use crate::data::{RequestTarget, SeriesSource, fetch_with_cache};
use crate::domain::{Observation, Provider, RawSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 10000;

pub struct FredClient {
    client: Client,
    api_key: Option<String>,
    cache: DiskCache,
    timeout: Duration,
}

impl FredClient {
    pub fn new(client: Client, api_key: Option<String>, cache: DiskCache, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            cache,
            timeout,
        }
    }

    fn fetch_live(&self, series_id: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing FRED_API_KEY in environment (.env).".to_string()))?;
        let target = RequestTarget {
            provider: Provider::Fred,
            series_id,
            timeout: self.timeout,
        };
        debug!(series_id, "requesting FRED observations");

        let sent = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", api_key),
                ("file_type", "json"),
                ("limit", &OBS_LIMIT.to_string()),
            ])
            .send();
        target.read_body(sent)
    }
}

impl SeriesSource for FredClient {
    fn provider(&self) -> Provider {
        Provider::Fred
    }

    fn fetch(&self, series_id: &str, force_refresh: bool) -> Result<RawSeries, AppError> {
        let series_id = series_id.to_uppercase();
        fetch_with_cache(
            &self.cache,
            &fred_cache_name(&series_id),
            force_refresh,
            |body| parse_observations(body, &series_id),
            || self.fetch_live(&series_id),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Option<Vec<FredObservation>>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

/// Parse a FRED `series/observations` payload.
///
/// `"."` marks a missing value. A payload with no observations is malformed
/// rather than an empty series.
pub fn parse_observations(body: &str, series_id: &str) -> Result<RawSeries, AppError> {
    let target = RequestTarget {
        provider: Provider::Fred,
        series_id,
        timeout: Duration::ZERO,
    };
    let parsed: ObservationsResponse =
        serde_json::from_str(body).map_err(|e| target.malformed(format!("invalid JSON: {e}")))?;

    if let Some(message) = parsed.error_message {
        return Err(target.fetch_error(message));
    }
    let observations = parsed
        .observations
        .filter(|obs| !obs.is_empty())
        .ok_or_else(|| target.malformed("no observations in payload"))?;

    let mut out = Vec::with_capacity(observations.len());
    for obs in observations {
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| target.malformed(format!("invalid date '{}': {e}", obs.date)))?;
        out.push(Observation::new(date, parse_value(&obs.value)));
    }
    Ok(RawSeries::new(series_id, out))
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
