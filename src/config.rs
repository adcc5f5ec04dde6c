//! Runtime settings from the environment (and an optional `.env` file).
//!
//! | variable | default |
//! |---|---|
//! | `FRED_API_KEY` | required for FRED series |
//! | `BLS_API_KEY` | required for BLS series |
//! | `GOOGLE_API_KEY` | required for narratives |
//! | `GEMINI_MODEL` | `gemini-2.5-flash` |
//! | `MACRO_CACHE_DIR` | `data/cached` |
//! | `MACRO_CACHE_TTL_SECS` | `86400` |
//! | `MACRO_HTTP_TIMEOUT_SECS` | `30` |

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CACHE_DIR: &str = "data/cached";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Settings {
    pub fred_api_key: Option<String>,
    pub bls_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fred_api_key: None,
            bls_api_key: None,
            google_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_ttl: DEFAULT_CACHE_TTL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read settings from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            fred_api_key: non_empty("FRED_API_KEY"),
            bls_api_key: non_empty("BLS_API_KEY"),
            google_api_key: non_empty("GOOGLE_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            cache_dir: non_empty("MACRO_CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.cache_dir),
            cache_ttl: parse_secs("MACRO_CACHE_TTL_SECS", non_empty("MACRO_CACHE_TTL_SECS"))?
                .unwrap_or(defaults.cache_ttl),
            http_timeout: parse_secs("MACRO_HTTP_TIMEOUT_SECS", non_empty("MACRO_HTTP_TIMEOUT_SECS"))?
                .unwrap_or(defaults.http_timeout),
        })
    }

    /// A key that must be present for the requested operation.
    pub fn require<'a>(&'a self, key: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
        key.as_deref()
            .ok_or_else(|| AppError::Config(format!("Missing {name} in environment (.env).")))
    }
}

fn parse_secs(name: &str, raw: Option<String>) -> Result<Option<Duration>, AppError> {
    raw.map(|v| {
        v.parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| AppError::Config(format!("{name} must be a whole number of seconds, got '{v}': {e}")))
    })
    .transpose()
}
