//! Domain models for matching-engine.

use chrono::{DateTime, NaiveDate, Utc};
use engine_core::models::StandardizedTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Indonesian tax invoice (faktur pajak) as entered for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInvoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub vendor_name: String,
    /// Vendor tax identification number, when known.
    pub vendor_npwp: Option<String>,
    /// Taxable base amount (dasar pengenaan pajak).
    pub dpp: Decimal,
    /// Value-added tax amount (pajak pertambahan nilai).
    pub ppn: Decimal,
    pub total_amount: Decimal,
    pub match_status: InvoiceMatchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceMatchStatus {
    Unmatched,
    AutoMatched,
    ManualMatched,
    Disputed,
}

impl InvoiceMatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::AutoMatched => "auto_matched",
            Self::ManualMatched => "manual_matched",
            Self::Disputed => "disputed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "auto_matched" => Self::AutoMatched,
            "manual_matched" => Self::ManualMatched,
            "disputed" => Self::Disputed,
            _ => Self::Unmatched,
        }
    }
}

/// A bank transaction registered with a project, under an engine-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTransaction {
    pub transaction_id: Uuid,
    pub txn: StandardizedTransaction,
}

/// Per-field and weighted total scores for one invoice/transaction pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchScore {
    pub amount_score: f64,
    pub date_score: f64,
    pub vendor_score: f64,
    pub reference_score: f64,
    pub total_score: f64,
}

/// Confidence tier derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceTier {
    pub fn from_score(total_score: f64) -> Self {
        if total_score >= 0.90 {
            Self::High
        } else if total_score >= 0.70 {
            Self::Medium
        } else if total_score >= 0.50 {
            Self::Low
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Auto,
    Manual,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Proposed,
    Confirmed,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => Self::Confirmed,
            "rejected" => Self::Rejected,
            _ => Self::Proposed,
        }
    }

    /// A rejected match releases both sides; anything else holds them.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// One invoice/transaction match record. Append-only in spirit: a rejected
/// match stays in the project history and a re-match creates a fresh record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationMatch {
    pub match_id: Uuid,
    pub project_id: Uuid,
    pub invoice_id: Uuid,
    pub transaction_id: Uuid,
    pub score: MatchScore,
    pub tier: ConfidenceTier,
    pub match_type: MatchType,
    pub status: MatchStatus,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub confirmed_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoMatchSummary {
    pub matches_found: usize,
    pub high_confidence_count: usize,
    pub medium_confidence_count: usize,
    pub low_confidence_count: usize,
    pub processing_time_ms: u64,
}

/// Full result of one auto-match pass.
#[derive(Debug, Clone)]
pub struct AutoMatchResult {
    pub summary: AutoMatchSummary,
    pub matches: Vec<ReconciliationMatch>,
    pub unmatched_invoice_ids: Vec<Uuid>,
    pub unmatched_transaction_ids: Vec<Uuid>,
}

/// A scored candidate for one invoice, used by suggestion listings.
#[derive(Debug, Clone)]
pub struct MatchSuggestion {
    pub transaction_id: Uuid,
    pub score: MatchScore,
    pub tier: ConfidenceTier,
}

/// An invoice or transaction the project rejected on ingestion, with the
/// reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRejection {
    pub index: usize,
    pub reason: String,
}
