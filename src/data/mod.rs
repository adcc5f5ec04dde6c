//! Source fetchers.
//!
//! - `SeriesSource`: one implementation per provider (FRED, BLS, Treasury)
//! - `Sources`: provider → fetcher registry used by the pipeline
//! - `cache`: raw-payload disk cache with a modification-time TTL
//!
//! Every fetcher follows the same flow (`fetch_with_cache`): serve a fresh
//! cache file, otherwise fetch live and store the raw payload. A corrupt cache
//! file is logged and replaced by a live fetch.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::{info, warn};

use crate::config::Settings;
use crate::domain::{Provider, RawSeries, SeriesKey};
use crate::error::AppError;

pub mod bls;
pub mod cache;
pub mod fred;
pub mod treasury;

pub use bls::BlsClient;
pub use cache::DiskCache;
pub use fred::FredClient;
pub use treasury::TreasuryClient;

/// A provider of raw observations for a series id.
pub trait SeriesSource {
    fn provider(&self) -> Provider;

    /// Ordered observations for `series_id`. `force_refresh` skips the cache
    /// freshness check.
    fn fetch(&self, series_id: &str, force_refresh: bool) -> Result<RawSeries, AppError>;
}

/// One fetcher per provider.
pub struct Sources {
    fred: Box<dyn SeriesSource>,
    bls: Box<dyn SeriesSource>,
    treasury: Box<dyn SeriesSource>,
}

impl Sources {
    pub fn new(fred: Box<dyn SeriesSource>, bls: Box<dyn SeriesSource>, treasury: Box<dyn SeriesSource>) -> Self {
        Self { fred, bls, treasury }
    }

    /// Live HTTP fetchers sharing one cache directory.
    ///
    /// API keys are checked lazily, so a cached series works without its key.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let cache = DiskCache::new(&settings.cache_dir, settings.cache_ttl);
        let client = http_client(settings.http_timeout)?;
        Ok(Self::new(
            Box::new(FredClient::new(
                client.clone(),
                settings.fred_api_key.clone(),
                cache.clone(),
                settings.http_timeout,
            )),
            Box::new(BlsClient::new(
                client.clone(),
                settings.bls_api_key.clone(),
                cache.clone(),
                settings.http_timeout,
            )),
            Box::new(TreasuryClient::new(client, cache, settings.http_timeout)),
        ))
    }

    pub fn get(&self, provider: Provider) -> &dyn SeriesSource {
        match provider {
            Provider::Fred => self.fred.as_ref(),
            Provider::Bls => self.bls.as_ref(),
            Provider::Treasury => self.treasury.as_ref(),
        }
    }

    /// Fetch a catalog series from its provider.
    pub fn fetch(&self, key: SeriesKey, force_refresh: bool) -> Result<RawSeries, AppError> {
        self.get(key.provider()).fetch(key.series_id(), force_refresh)
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("macro-fusion/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Identifies the request an HTTP failure belongs to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestTarget<'a> {
    pub provider: Provider,
    pub series_id: &'a str,
    pub timeout: Duration,
}

impl RequestTarget<'_> {
    pub fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::FetchTimeout {
                provider: self.provider,
                series_id: self.series_id.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            self.fetch_error(err.to_string())
        }
    }

    pub fn fetch_error(&self, message: impl Into<String>) -> AppError {
        AppError::FetchError {
            provider: self.provider,
            series_id: self.series_id.to_string(),
            message: message.into(),
        }
    }

    pub fn malformed(&self, message: impl Into<String>) -> AppError {
        AppError::MalformedResponse {
            provider: self.provider,
            series_id: self.series_id.to_string(),
            message: message.into(),
        }
    }

    /// Status check plus body read for a sent request.
    pub fn read_body(&self, sent: Result<Response, reqwest::Error>) -> Result<String, AppError> {
        let resp = sent.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.fetch_error(format!("request failed with status {status}")));
        }
        resp.text().map_err(|e| self.transport_error(e))
    }
}

/// Shared cache-then-live flow for every fetcher.
///
/// `parse` turns a raw payload into observations; `live` performs the HTTP
/// request and returns the raw payload. The payload (not the parsed series) is
/// what gets cached.
pub(crate) fn fetch_with_cache<P, L>(
    cache: &DiskCache,
    cache_name: &str,
    force_refresh: bool,
    parse: P,
    live: L,
) -> Result<RawSeries, AppError>
where
    P: Fn(&str) -> Result<RawSeries, AppError>,
    L: FnOnce() -> Result<String, AppError>,
{
    let fresh = cache.load_fresh(cache_name);

    if !force_refresh {
        if let Some(body) = &fresh {
            match parse(body) {
                Ok(series) => {
                    info!(cache = cache_name, n = series.len(), "serving cached series");
                    return Ok(series);
                }
                Err(err) => warn!(cache = cache_name, error = %err, "cache unreadable, fetching live"),
            }
        }
    }

    let live_result = live().and_then(|body| parse(&body).map(|series| (body, series)));
    match live_result {
        Ok((body, series)) => {
            if let Err(err) = cache.store(cache_name, &body) {
                warn!(cache = cache_name, error = %err, "failed to write cache");
            }
            info!(cache = cache_name, n = series.len(), "fetched live series");
            Ok(series)
        }
        Err(live_err) => {
            let fallback = fresh.as_deref().and_then(|body| parse(body).ok());
            match fallback {
                Some(series) => {
                    warn!(cache = cache_name, error = %live_err, "live fetch failed, using cached data");
                    Ok(series)
                }
                None => Err(live_err),
            }
        }
    }
}
