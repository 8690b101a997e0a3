//! Reconciliation matching engine: tax invoices against standardized bank
//! transactions, with weighted scoring, greedy auto-matching, and a
//! propose/confirm/reject match lifecycle.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::MatchError;
pub use services::engine::MatchingEngine;
