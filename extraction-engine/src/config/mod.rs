//! Configuration module for extraction-engine.

use std::env;

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Rows at or above this confidence skip the fallback extractor.
    pub accept_threshold: f64,
    /// Rounding tolerance for the balance-chain check.
    pub balance_tolerance: rust_decimal::Decimal,
    /// Neighbour rows included on each side of a fallback request.
    pub fallback_context_rows: usize,
    pub workers: WorkerConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_count: usize,
    pub queue_size: usize,
}

#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.90,
            balance_tolerance: engine_core::models::BALANCE_TOLERANCE
                .parse()
                .expect("static tolerance"),
            fallback_context_rows: 1,
            workers: WorkerConfig {
                worker_count: 4,
                queue_size: 64,
            },
            fallback: FallbackConfig {
                api_key: None,
                model: "gemini-2.0-flash".to_string(),
                timeout_secs: 120,
            },
        }
    }
}

impl ExtractionConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            accept_threshold: env::var("EXTRACTION_ACCEPT_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.accept_threshold),
            balance_tolerance: env::var("EXTRACTION_BALANCE_TOLERANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.balance_tolerance),
            fallback_context_rows: env::var("EXTRACTION_FALLBACK_CONTEXT_ROWS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fallback_context_rows),
            workers: WorkerConfig {
                worker_count: env::var("EXTRACTION_WORKER_COUNT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.workers.worker_count),
                queue_size: env::var("EXTRACTION_QUEUE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.workers.queue_size),
            },
            fallback: FallbackConfig {
                api_key: env::var("GEMINI_API_KEY").ok(),
                model: env::var("GEMINI_MODEL").unwrap_or(defaults.fallback.model),
                timeout_secs: env::var("FALLBACK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.fallback.timeout_secs),
            },
        }
    }
}
