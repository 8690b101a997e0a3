//! Domain models for extraction-engine.

use engine_core::models::StandardizedTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// OCR Input Contract
// ============================================================================

/// Structured OCR output for one document, as produced by the external
/// document-AI collaborator. Bounding boxes are ignored by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub document_id: Uuid,
    /// Full plain text of the document, used for bank detection and header
    /// field extraction.
    pub full_text: String,
    pub pages: Vec<OcrPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
    pub tables: Vec<OcrTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrTable {
    pub rows: Vec<OcrRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRow {
    pub cells: Vec<String>,
}

impl OcrPage {
    /// All table rows on the page in source order.
    pub fn rows(&self) -> impl Iterator<Item = &OcrRow> {
        self.tables.iter().flat_map(|t| t.rows.iter())
    }
}

// ============================================================================
// Adapter Output
// ============================================================================

/// Account-level fields an adapter reads from the statement header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementHeader {
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_holder: String,
    pub opening_balance: Option<Decimal>,
    /// Statement period year, used to resolve day/month-only date columns.
    pub period_year: Option<i32>,
}

/// One deterministically parsed table row plus the context needed to escalate
/// it to the fallback extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRow {
    pub txn: StandardizedTransaction,
    pub confidence: f64,
    pub page: u32,
    pub row_index: usize,
    pub raw_cells: Vec<String>,
}

/// A row the adapter could not turn into a candidate at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    pub page: u32,
    pub row_index: usize,
    pub reason: String,
    pub raw_cells: Vec<String>,
}

/// Result of parsing one page with one adapter.
#[derive(Debug, Clone, Default)]
pub struct PageParse {
    pub rows: Vec<ParsedRow>,
    pub failures: Vec<RowFailure>,
}

// ============================================================================
// Pipeline Output
// ============================================================================

/// Structured, per-unit degradation record. Anomalies annotate a best-effort
/// result; they never abort a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// One row could not be confidently extracted even after fallback.
    RowParseFailure {
        page: u32,
        row_index: usize,
        reason: String,
    },
    /// Running balance mismatch beyond tolerance over a contiguous row range.
    BalanceChainViolation {
        page: u32,
        first_row: usize,
        last_row: usize,
        expected_balance: Decimal,
        actual_balance: Decimal,
    },
    /// The fallback extractor was unreachable; affected rows were kept at
    /// their rule-based confidence.
    FallbackUnavailable { affected_rows: usize, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesInfo {
    pub total_pages: u32,
    pub pages_with_transactions: u32,
    /// Transaction count per page, indexed by 1-based page number.
    pub transactions_per_page: Vec<(u32, usize)>,
    /// Strong signal of missed or unscanned pages; surfaced for audit, not
    /// acted on automatically.
    pub pages_with_zero_transactions: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Completed,
    Partial,
    Cancelled,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "partial" => Self::Partial,
            "cancelled" => Self::Cancelled,
            _ => Self::Completed,
        }
    }
}

/// Per-document output of the hybrid extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementExtraction {
    pub document_id: Uuid,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_holder: String,
    /// Source page/row order is preserved; required by the balance-chain
    /// invariant and audit traceability.
    pub transactions: Vec<StandardizedTransaction>,
    pub anomalies: Vec<Anomaly>,
    pub pages_info: PagesInfo,
    pub status: ExtractionStatus,
}

// ============================================================================
// Batch Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    Cancelled,
}

/// A document the batch could not extract at all (e.g. unknown bank).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document_id: Uuid,
    pub reason: String,
}

/// Outcome of a multi-document batch run. A cancelled batch still carries
/// every document validated before the cancellation point.
#[derive(Debug)]
pub struct BatchOutcome {
    pub extractions: Vec<StatementExtraction>,
    pub failures: Vec<DocumentFailure>,
    pub status: BatchStatus,
}
