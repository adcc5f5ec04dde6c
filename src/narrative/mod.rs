//! Natural-language explanations grounded in the computed analytics.
//!
//! - `NarrativeGenerator`: text generation backend (Gemini in production, stubs in tests)
//! - `ContextRetriever`: curated series notes ranked by query overlap
//! - `build_prompt`: analyst prompt from knowledge, context, summary and recent rows
//!
//! `explain` never fails: a backend error becomes `Narrative::Failed` with a
//! retry hint, so callers can always print something.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::analytics::summary::InsightSummary;
use crate::domain::AlignedTable;
use crate::error::AppError;

pub mod gemini;
pub mod prompt;
pub mod retrieval;

pub use gemini::GeminiClient;
pub use prompt::{PromptParts, build_prompt};
pub use retrieval::{ContextRetriever, KnowledgeChunk};

pub trait NarrativeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Narrative {
    Text(String),
    /// Generation failed; the message tells the user to retry.
    Failed(String),
}

impl Narrative {
    pub fn is_failed(&self) -> bool {
        matches!(self, Narrative::Failed(_))
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Narrative::Text(text) | Narrative::Failed(text) => f.write_str(text),
        }
    }
}

/// A question plus the analytics it should be answered from.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub question: &'a str,
    pub data_context: &'a str,
    pub summary: Option<&'a InsightSummary>,
    pub table: Option<&'a AlignedTable>,
}

pub fn explain(
    generator: &dyn NarrativeGenerator,
    retriever: &ContextRetriever,
    request: NarrativeRequest<'_>,
) -> Narrative {
    let knowledge = retriever.render(request.question);
    let prompt = build_prompt(PromptParts {
        question: request.question,
        knowledge: &knowledge,
        data_context: request.data_context,
        summary: request.summary,
        table: request.table,
    });
    debug!(prompt_chars = prompt.len(), "narrative prompt built");

    match generator.generate(&prompt) {
        Ok(text) => Narrative::Text(text),
        Err(err) => {
            warn!(error = %err, "narrative generation failed");
            Narrative::Failed(format!("{err}. Try again."))
        }
    }
}
