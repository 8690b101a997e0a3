//! Gemini-backed fallback extractor.
//!
//! Sends the ambiguous rows of one document in a single structured-JSON
//! request and maps the response back to per-row outcomes.

use super::{FallbackExtractor, FallbackOutcome, FallbackRequest, ProviderError, TransactionDraft};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROMPT_PREAMBLE: &str = "You are extracting bank statement transactions from OCR table rows \
that a deterministic parser could not handle. For each input row, return one JSON object with \
row_index, page, and either a transaction (transaction_date as YYYY-MM-DD, description, optional \
transaction_type and reference_number, debit and credit as decimal strings where exactly one is \
non-zero, optional balance) or a failure reason. Amounts may use Indonesian formatting \
(thousands '.', decimal ','). Respond with a JSON array, one element per input row, in order.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

pub struct GeminiExtractor {
    config: GeminiConfig,
    client: Client,
}

impl GeminiExtractor {
    /// Build from the engine's fallback configuration. A missing API key is
    /// `NotConfigured`, which callers treat as "run rule-based only".
    pub fn from_config(config: &crate::config::FallbackConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured("GEMINI_API_KEY not set".to_string())
        })?;
        Self::new(GeminiConfig {
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("missing API key".to_string()));
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE, self.config.model, method, self.config.api_key
        )
    }

    fn build_prompt(&self, requests: &[FallbackRequest]) -> String {
        let mut prompt = String::from(PROMPT_PREAMBLE);
        prompt.push_str("\n\nInput rows:\n");
        for req in requests {
            prompt.push_str(&format!(
                "- page {} row {}: cells {:?}; before: {:?}; after: {:?}\n",
                req.page, req.row_index, req.raw_cells, req.context_before, req.context_after
            ));
        }
        prompt
    }
}

#[async_trait]
impl FallbackExtractor for GeminiExtractor {
    async fn extract_rows(
        &self,
        requests: &[FallbackRequest],
    ) -> Result<Vec<FallbackOutcome>, ProviderError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: self.build_prompt(requests),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                response_mime_type: Some("application/json".to_string()),
            }),
        };

        tracing::debug!(
            model = %self.config.model,
            row_count = requests.len(),
            "Sending fallback extraction batch to Gemini"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!("{}: {}", status, body)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("malformed response: {}", e)))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::ApiError("empty response".to_string()))?;

        let rows: Vec<FallbackRowResponse> = serde_json::from_str(&text)
            .map_err(|e| ProviderError::ApiError(format!("unparsable row payload: {}", e)))?;

        // Align by (page, row_index) rather than trusting response order.
        let outcomes = requests
            .iter()
            .map(|req| {
                match rows
                    .iter()
                    .find(|r| r.page == req.page && r.row_index == req.row_index)
                {
                    Some(row) => match &row.transaction {
                        Some(draft) => FallbackOutcome::Extracted(draft.clone()),
                        None => FallbackOutcome::Failed {
                            reason: row
                                .reason
                                .clone()
                                .unwrap_or_else(|| "no transaction returned".to_string()),
                        },
                    },
                    None => FallbackOutcome::Failed {
                        reason: "row missing from response".to_string(),
                    },
                }
            })
            .collect();

        Ok(outcomes)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!(
            "{}/models/{}?key={}",
            GEMINI_API_BASE, self.config.model, self.config.api_key
        );
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(response.status().to_string()))
        }
    }
}

// Gemini API request/response types.

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// One element of the structured row payload.
#[derive(Debug, Deserialize)]
struct FallbackRowResponse {
    page: u32,
    row_index: usize,
    #[serde(default)]
    transaction: Option<TransactionDraft>,
    #[serde(default)]
    reason: Option<String>,
}
