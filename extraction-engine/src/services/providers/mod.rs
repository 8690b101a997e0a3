//! Fallback extractor abstractions and implementations.
//!
//! The fallback extractor is the one network-bound collaborator in the
//! pipeline: a language model that receives the rows deterministic parsing
//! could not handle, plus surrounding context, and returns one structured
//! candidate per row or an explicit per-row failure. Trait-based so backends
//! (Gemini, mock) can be swapped.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiConfig, GeminiExtractor};
pub use mock::MockExtractor;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for fallback provider operations. Any of these degrades the
/// pipeline to rule-based-only output; they never abort a document.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// One ambiguous row sent to the fallback extractor.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackRequest {
    pub page: u32,
    pub row_index: usize,
    pub raw_cells: Vec<String>,
    /// Neighbouring rows rendered as text, for context.
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// Structured row candidate returned by the fallback extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub transaction_date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

/// Per-row outcome; a failed row stays with its rule-based candidate.
#[derive(Debug, Clone)]
pub enum FallbackOutcome {
    Extracted(TransactionDraft),
    Failed { reason: String },
}

/// Trait for fallback extraction backends.
///
/// `extract_rows` takes the whole batch for one document in a single call:
/// round trips are bounded per document, not per row.
#[async_trait]
pub trait FallbackExtractor: Send + Sync {
    async fn extract_rows(
        &self,
        requests: &[FallbackRequest],
    ) -> Result<Vec<FallbackOutcome>, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}
