//! Configuration module for matching-engine.

use std::env;

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Auto-match commits only pairs at or above this total score.
    pub min_confidence: f64,
    /// Default number of candidates returned by suggestion listings.
    pub suggestion_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.70,
            suggestion_limit: 5,
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            min_confidence: env::var("MATCHING_MIN_CONFIDENCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_confidence),
            suggestion_limit: env::var("MATCHING_SUGGESTION_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.suggestion_limit),
        }
    }
}
