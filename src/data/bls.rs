//! BLS public API v2 time series.

use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::cache::{DiskCache, bls_cache_name};
use crate::data::{RequestTarget, SeriesSource, fetch_with_cache};
use crate::domain::{Observation, Provider, RawSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";

/// Years of history requested (the v2 API caps a single request at 20).
pub const HISTORY_YEARS: i32 = 20;

const STATUS_OK: &str = "REQUEST_SUCCEEDED";

pub struct BlsClient {
    client: Client,
    api_key: Option<String>,
    cache: DiskCache,
    timeout: Duration,
}

impl BlsClient {
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
            .ok_or_else(|| AppError::Config("Missing BLS_API_KEY in environment (.env).".to_string()))?;
        let target = RequestTarget {
            provider: Provider::Bls,
            series_id,
            timeout: self.timeout,
        };
        let body = BlsRequest::new(series_id, api_key, Local::now().year());
        debug!(series_id, start = %body.startyear, end = %body.endyear, "requesting BLS series");

        let sent = self.client.post(BASE_URL).json(&body).send();
        target.read_body(sent)
    }
}

impl SeriesSource for BlsClient {
    fn provider(&self) -> Provider {
        Provider::Bls
    }

    fn fetch(&self, series_id: &str, force_refresh: bool) -> Result<RawSeries, AppError> {
        fetch_with_cache(
            &self.cache,
            &bls_cache_name(series_id),
            force_refresh,
            |body| parse_series(body, series_id),
            || self.fetch_live(series_id),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlsRequest<'a> {
    pub seriesid: [&'a str; 1],
    pub startyear: String,
    pub endyear: String,
    pub registrationkey: &'a str,
}

impl<'a> BlsRequest<'a> {
    /// Request covering the `HISTORY_YEARS` years ending at `end_year`.
    pub fn new(series_id: &'a str, api_key: &'a str, end_year: i32) -> Self {
        Self {
            seriesid: [series_id],
            startyear: (end_year - HISTORY_YEARS + 1).to_string(),
            endyear: end_year.to_string(),
            registrationkey: api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlsResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results")]
    results: Option<BlsResults>,
}

#[derive(Debug, Deserialize)]
struct BlsResults {
    #[serde(default)]
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    #[serde(default)]
    data: Vec<BlsDatum>,
}

#[derive(Debug, Deserialize)]
struct BlsDatum {
    year: String,
    period: String,
    value: String,
}

/// Parse a BLS v2 payload.
///
/// Monthly periods `M01`..`M12` become the first of the month; `M13` (annual
/// average) and non-monthly periods are skipped. Unparseable values such as
/// `"-"` are missing.
pub fn parse_series(body: &str, series_id: &str) -> Result<RawSeries, AppError> {
    let target = RequestTarget {
        provider: Provider::Bls,
        series_id,
        timeout: Duration::ZERO,
    };
    let parsed: BlsResponse = serde_json::from_str(body).map_err(|e| target.malformed(format!("invalid JSON: {e}")))?;

    if parsed.status != STATUS_OK {
        let detail = if parsed.message.is_empty() {
            parsed.status
        } else {
            format!("{}: {}", parsed.status, parsed.message.join("; "))
        };
        return Err(target.fetch_error(detail));
    }

    let data = parsed
        .results
        .and_then(|r| r.series.into_iter().next())
        .map(|s| s.data)
        .ok_or_else(|| target.malformed("no series in Results"))?;

    let mut out = Vec::with_capacity(data.len());
    for datum in data {
        let Some(month) = monthly_period(&datum.period) else {
            continue;
        };
        let year: i32 = datum
            .year
            .trim()
            .parse()
            .map_err(|e| target.malformed(format!("invalid year '{}': {e}", datum.year)))?;
        let date = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| target.malformed(format!("invalid date {year}-{}", datum.period)))?;
        let value = datum.value.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        out.push(Observation::new(date, value));
    }

    if out.is_empty() {
        return Err(target.malformed("no monthly observations in payload"));
    }
    Ok(RawSeries::new(series_id, out))
}

/// Month number for `M01`..`M12`.
fn monthly_period(period: &str) -> Option<u32> {
    let month: u32 = period.strip_prefix('M')?.parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}
