//! Treasury Fiscal Data "Debt to the Penny".
//!
//! Daily total public debt outstanding, rescaled from dollars to billions.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::data::cache::{DiskCache, TREASURY_CACHE_NAME};
use crate::data::{RequestTarget, SeriesSource, fetch_with_cache};
use crate::domain::{Observation, Provider, RawSeries};
use crate::error::AppError;

const BASE_URL: &str =
    "https://api.fiscaldata.treasury.gov/services/api/fiscal_service/v2/accounting/od/debt_to_penny";
const PAGE_SIZE: usize = 10000;
const HISTORY_START: &str = "2000-01-01";
const DOLLARS_PER_BILLION: f64 = 1e9;

/// Series id reported for the single Treasury dataset.
pub const DEBT_SERIES_ID: &str = "debt_to_penny";

pub struct TreasuryClient {
    client: Client,
    cache: DiskCache,
    timeout: Duration,
}

impl TreasuryClient {
    pub fn new(client: Client, cache: DiskCache, timeout: Duration) -> Self {
        Self { client, cache, timeout }
    }

    fn fetch_live(&self) -> Result<String, AppError> {
        let target = RequestTarget {
            provider: Provider::Treasury,
            series_id: DEBT_SERIES_ID,
            timeout: self.timeout,
        };
        debug!("requesting Treasury debt to the penny");

        let sent = self
            .client
            .get(BASE_URL)
            .query(&[
                ("fields", "record_date,tot_pub_debt_out_amt"),
                ("filter", &format!("record_date:gte:{HISTORY_START}")),
                ("format", "json"),
                ("page[size]", &PAGE_SIZE.to_string()),
            ])
            .send();
        target.read_body(sent)
    }
}

impl SeriesSource for TreasuryClient {
    fn provider(&self) -> Provider {
        Provider::Treasury
    }

    /// The Treasury source serves one dataset; `series_id` is not sent upstream.
    fn fetch(&self, series_id: &str, force_refresh: bool) -> Result<RawSeries, AppError> {
        if series_id != DEBT_SERIES_ID {
            return Err(AppError::InvalidRequest(format!(
                "unknown Treasury series '{series_id}' (only '{DEBT_SERIES_ID}' is available)"
            )));
        }
        fetch_with_cache(&self.cache, TREASURY_CACHE_NAME, force_refresh, parse_debt, || {
            self.fetch_live()
        })
    }
}

#[derive(Debug, Deserialize)]
struct DebtResponse {
    data: Option<Vec<DebtRecord>>,
}

#[derive(Debug, Deserialize)]
struct DebtRecord {
    record_date: String,
    tot_pub_debt_out_amt: Option<String>,
}

/// Parse a `debt_to_penny` payload into billions of dollars.
pub fn parse_debt(body: &str) -> Result<RawSeries, AppError> {
    let target = RequestTarget {
        provider: Provider::Treasury,
        series_id: DEBT_SERIES_ID,
        timeout: Duration::ZERO,
    };
    let parsed: DebtResponse = serde_json::from_str(body).map_err(|e| target.malformed(format!("invalid JSON: {e}")))?;
    let records = parsed
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| target.malformed("no records in payload"))?;

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let date = NaiveDate::parse_from_str(&record.record_date, "%Y-%m-%d")
            .map_err(|e| target.malformed(format!("invalid record_date '{}': {e}", record.record_date)))?;
        let value = record
            .tot_pub_debt_out_amt
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .map(|dollars| dollars / DOLLARS_PER_BILLION);
        out.push(Observation::new(date, value));
    }
    Ok(RawSeries::new(DEBT_SERIES_ID, out))
}
