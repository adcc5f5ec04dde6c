//! Google Gemini `generateContent` client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::data::http_client;
use crate::error::AppError;
use crate::narrative::NarrativeGenerator;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let api_key = settings.require(&settings.google_api_key, "GOOGLE_API_KEY")?;
        Ok(Self::new(
            http_client(settings.http_timeout)?,
            api_key,
            settings.gemini_model.clone(),
            settings.http_timeout,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl NarrativeGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{BASE_URL}/{}:generateContent", self.model);
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting generation");

        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::GenerationFailure(format!("timed out after {}s", self.timeout.as_secs()))
                } else {
                    AppError::GenerationFailure(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::GenerationFailure(format!("request failed with status {status}")));
        }
        let body = resp.text().map_err(|e| AppError::GenerationFailure(e.to_string()))?;
        parse_generation(&body)
    }
}

/// Concatenated text of the first candidate.
pub fn parse_generation(body: &str) -> Result<String, AppError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AppError::GenerationFailure(format!("invalid response: {e}")))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::GenerationFailure("response contained no text".to_string()));
    }
    Ok(text.to_string())
}
