//! Matching services: pair scoring, the reconciliation engine, and metrics.

pub mod engine;
pub mod metrics;
pub mod scoring;

pub use engine::MatchingEngine;
