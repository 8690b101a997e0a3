//! Error types for matching operations.

use crate::models::ReconciliationMatch;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Match not found: {0}")]
    MatchNotFound(Uuid),

    /// One side already has an active match. Carries the existing record so
    /// the caller can show what blocks the new match.
    #[error("Side already matched by {}", .existing.match_id)]
    Conflict { existing: Box<ReconciliationMatch> },

    #[error("Invalid period: start {start} is after end {end}")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Project has no invoices or no transactions to match")]
    EmptyProject,

    #[error("Invalid match transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
