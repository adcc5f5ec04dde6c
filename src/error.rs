//! Error taxonomy for the fetch → align → analyze pipeline.
//!
//! Only hard structural failures live here. Expected analytic edge cases
//! (short windows, missing lags) are encoded as sentinels in the result types
//! instead.

use thiserror::Error;

use crate::domain::Provider;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// No raw observations intersect the requested years, or the aligned table
    /// is wholly missing.
    #[error("No data in range {start_year}-{end_year}: {detail}")]
    NoDataInRange {
        start_year: i32,
        end_year: i32,
        detail: String,
    },

    /// Too few points to fit a forecast.
    #[error("Insufficient history: forecasting needs at least {required} points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("{provider} request for '{series_id}' timed out after {timeout_secs}s")]
    FetchTimeout {
        provider: Provider,
        series_id: String,
        timeout_secs: u64,
    },

    #[error("{provider} request for '{series_id}' failed: {message}")]
    FetchError {
        provider: Provider,
        series_id: String,
        message: String,
    },

    #[error("{provider} returned a malformed payload for '{series_id}': {message}")]
    MalformedResponse {
        provider: Provider,
        series_id: String,
        message: String,
    },

    #[error("Narrative generation failed: {0}")]
    GenerationFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Process exit code for the `mf` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::InvalidRequest(_) | AppError::Io(_) => 2,
            AppError::NoDataInRange { .. } | AppError::InsufficientHistory { .. } => 3,
            AppError::FetchTimeout { .. }
            | AppError::FetchError { .. }
            | AppError::MalformedResponse { .. }
            | AppError::GenerationFailure(_) => 4,
        }
    }

    /// A short, user-facing hint on how to recover.
    pub fn remediation(&self) -> &'static str {
        match self {
            AppError::NoDataInRange { .. } => "Widen the year range or pick a series that covers it.",
            AppError::InsufficientHistory { .. } => {
                "Widen the year range so the primary series has at least 12 points."
            }
            AppError::FetchTimeout { .. } => "Retry, or raise MACRO_HTTP_TIMEOUT_SECS.",
            AppError::FetchError { .. } => "Check the connection and API key, then retry.",
            AppError::MalformedResponse { .. } => "Retry later with --refresh; the provider payload changed shape.",
            AppError::GenerationFailure(_) => "Retry the question.",
            AppError::Config(_) => "Set the missing variable in the environment or .env file.",
            AppError::InvalidRequest(_) => "Select 1-2 series and a positive horizon.",
            AppError::Io(_) => "Check that the path exists and is writable.",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_by_failure_kind() {
        let no_data = AppError::NoDataInRange {
            start_year: 1950,
            end_year: 1960,
            detail: "GDP".to_string(),
        };
        assert_eq!(no_data.exit_code(), 3);
        assert!(no_data.to_string().contains("1950-1960"));

        let timeout = AppError::FetchTimeout {
            provider: Provider::Fred,
            series_id: "GDP".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(timeout.exit_code(), 4);
        assert!(timeout.to_string().contains("FRED"));

        assert_eq!(AppError::Config("x".into()).exit_code(), 2);
    }
}
