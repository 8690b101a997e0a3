//! Bank adapter contract and ordered registry.
//!
//! One adapter per supported bank/format version. Adapters are pure
//! transformations: a bad row becomes a per-row failure, never an error that
//! aborts the statement.

pub mod direction;

mod bca;
mod bca_v2;
mod bni;
mod bri;
mod cimb;
mod danamon;
mod mandiri;
mod maybank;
mod ocbc;
mod permata;

pub use bca::BcaAdapter;
pub use bca_v2::BcaV2Adapter;
pub use bni::BniAdapter;
pub use bri::BriAdapter;
pub use cimb::CimbNiagaAdapter;
pub use danamon::DanamonAdapter;
pub use mandiri::MandiriAdapter;
pub use maybank::MaybankAdapter;
pub use ocbc::OcbcNispAdapter;
pub use permata::PermataAdapter;

use crate::models::{OcrPage, OcrResult, PageParse, ParsedRow, RowFailure, StatementHeader};
use chrono::NaiveDate;
use engine_core::error::EngineError;
use engine_core::models::StandardizedTransaction;
use engine_core::utils::{dates, numeric, text};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Contract every bank format implements.
pub trait BankAdapter: std::fmt::Debug + Send + Sync {
    fn bank_name(&self) -> &'static str;

    fn bank_code(&self) -> &'static str;

    /// Whether the document's plain text looks like this bank's layout.
    /// Implemented as a weighted keyword count against a threshold.
    fn detect(&self, full_text: &str) -> bool;

    /// Account-level fields from the statement header.
    fn statement_header(&self, ocr: &OcrResult) -> StatementHeader;

    /// Map one page's table rows to canonical candidates.
    fn parse_page(&self, page: &OcrPage, header: &StatementHeader) -> PageParse;
}

/// Ordered adapter registry. Built once at startup and shared read-only by
/// all workers; priority is the explicit construction order, so variant
/// layouts (e.g. BCA V2) must be registered before the generic ones they
/// overlap with. First match wins.
pub struct BankRegistry {
    adapters: Vec<Box<dyn BankAdapter>>,
}

impl Default for BankRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl BankRegistry {
    pub fn new(adapters: Vec<Box<dyn BankAdapter>>) -> Self {
        Self { adapters }
    }

    /// The standard adapter set in detection priority order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(BcaV2Adapter::new()),
            Box::new(BcaAdapter::new()),
            Box::new(MandiriAdapter::new()),
            Box::new(BniAdapter::new()),
            Box::new(BriAdapter::new()),
            Box::new(CimbNiagaAdapter::new()),
            Box::new(PermataAdapter::new()),
            Box::new(DanamonAdapter::new()),
            Box::new(OcbcNispAdapter::new()),
            Box::new(MaybankAdapter::new()),
        ])
    }

    /// Run detection in priority order. Never guesses: an unrecognized
    /// document is an explicit error carrying the supported-bank list so the
    /// caller can prompt for manual selection.
    pub fn detect_bank(&self, full_text: &str) -> Result<&dyn BankAdapter, EngineError> {
        self.adapters
            .iter()
            .find(|a| a.detect(full_text))
            .map(|a| a.as_ref())
            .ok_or_else(|| EngineError::UnknownBank {
                supported: self.list_supported_banks(),
            })
    }

    /// For manual bank selection after a detection failure.
    pub fn get(&self, bank_code: &str) -> Option<&dyn BankAdapter> {
        self.adapters
            .iter()
            .find(|a| a.bank_code() == bank_code)
            .map(|a| a.as_ref())
    }

    pub fn list_supported_banks(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|a| a.bank_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

// ============================================================================
// Shared detection / header helpers
// ============================================================================

/// Weighted keyword score over the normalized document text.
pub(crate) fn keyword_score(full_text: &str, keywords: &[(&str, u32)]) -> u32 {
    let haystack = text::normalize(full_text);
    keywords
        .iter()
        .filter(|(kw, _)| haystack.contains(kw))
        .map(|(_, w)| *w)
        .sum()
}

/// Value following any of `labels` on the same line, with separators trimmed.
pub(crate) fn find_after_label(full_text: &str, labels: &[&str]) -> Option<String> {
    for line in full_text.lines() {
        // One uppercase char per source char keeps char offsets aligned with
        // the original line, unlike full normalization.
        let upper: String = line
            .chars()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .collect();
        for label in labels {
            if let Some(pos) = upper.find(label) {
                let value: String = line
                    .chars()
                    .skip(upper[..pos + label.len()].chars().count())
                    .collect();
                let value = value.trim().trim_start_matches([':', '.', '-']).trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("static regex"));

/// Statement period year, from the PERIODE/PERIOD line when present,
/// otherwise the first plausible year anywhere in the header text.
pub(crate) fn period_year(full_text: &str) -> Option<i32> {
    let from_line = full_text
        .lines()
        .find(|l| {
            let upper = text::normalize(l);
            upper.contains("PERIODE") || upper.contains("PERIOD")
        })
        .and_then(|l| YEAR_RE.find(l))
        .and_then(|m| m.as_str().parse().ok());

    from_line.or_else(|| {
        YEAR_RE
            .find(full_text)
            .and_then(|m| m.as_str().parse().ok())
    })
}

pub(crate) fn opening_balance(full_text: &str) -> Option<Decimal> {
    find_after_label(full_text, &["SALDO AWAL", "OPENING BALANCE", "BEGINNING BALANCE"])
        .and_then(|v| numeric::parse_amount(&v))
}

/// Tokens that mark column-header, summary, and carried-balance rows, which
/// are present in the OCR tables but are not transactions.
const NON_TRANSACTION_TOKENS: &[&str] = &[
    "TANGGAL",
    "TGL TRANS",
    "KETERANGAN",
    "URAIAN",
    "DESCRIPTION",
    "POSTING DATE",
    "MUTASI",
    "DEBET",
    "KREDIT",
    "DEBIT",
    "CREDIT",
    "BALANCE",
    "SALDO AWAL",
    "SALDO AKHIR",
    "CLOSING BALANCE",
    "HALAMAN",
    "BERSAMBUNG",
];

pub(crate) fn non_empty(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Header, summary, and carried-balance rows carry marker tokens but no
/// transaction date. A row with any parsable date cell is never filtered
/// here, so descriptions that merely mention a token ("PEMBELIAN KARTU
/// DEBIT") stay in the transaction stream; tokens must start a cell, not
/// just appear somewhere in it.
pub(crate) fn is_non_transaction_row(cells: &[String]) -> bool {
    if cells.iter().all(|c| c.trim().is_empty()) {
        return true;
    }
    if cells
        .iter()
        .any(|c| dates::parse_statement_date(c, Some(2000)).is_some())
    {
        return false;
    }
    cells.iter().any(|cell| {
        let cell = text::normalize(cell);
        NON_TRANSACTION_TOKENS.iter().any(|t| {
            cell.strip_prefix(t)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', ':', '.']))
        })
    })
}

// ============================================================================
// Row construction
// ============================================================================

/// Field weights for the per-row confidence score. Sum to 1.0.
const WEIGHT_DATE: f64 = 0.30;
const WEIGHT_DESCRIPTION: f64 = 0.20;
const WEIGHT_EXCLUSIVE: f64 = 0.30;
const WEIGHT_BALANCE: f64 = 0.20;

/// Carried date counts for half the date weight: plausible but not read from
/// the row itself.
const CARRIED_DATE_FACTOR: f64 = 0.5;

/// Intermediate row representation an adapter fills from its column layout.
#[derive(Debug, Default)]
pub(crate) struct RowDraft {
    pub transaction_date: Option<NaiveDate>,
    pub posting_date: Option<NaiveDate>,
    pub description: String,
    pub transaction_type: Option<String>,
    pub reference_number: Option<String>,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub branch_code: Option<String>,
    pub additional_info: Option<String>,
}

/// Turn a draft into a scored candidate, carrying the previous row's date
/// forward when the layout prints the date only on the first row of a day.
pub(crate) fn build_row(
    draft: RowDraft,
    header: &StatementHeader,
    page: u32,
    row_index: usize,
    raw_cells: &[String],
    last_date: &mut Option<NaiveDate>,
) -> Result<ParsedRow, RowFailure> {
    let (date, date_weight) = match draft.transaction_date {
        Some(d) => {
            *last_date = Some(d);
            (d, WEIGHT_DATE)
        }
        None => match *last_date {
            Some(d) => (d, WEIGHT_DATE * CARRIED_DATE_FACTOR),
            None => {
                return Err(RowFailure {
                    page,
                    row_index,
                    reason: "no parsable transaction date".to_string(),
                    raw_cells: raw_cells.to_vec(),
                })
            }
        },
    };

    let debit = draft.debit.unwrap_or_default();
    let credit = draft.credit.unwrap_or_default();
    let description = draft.description.trim().to_string();

    let mut confidence = date_weight;
    if description.chars().count() >= 3 {
        confidence += WEIGHT_DESCRIPTION;
    }
    let exclusive = (debit.is_zero() != credit.is_zero())
        && !debit.is_sign_negative()
        && !credit.is_sign_negative();
    if exclusive {
        confidence += WEIGHT_EXCLUSIVE;
    }
    if draft.balance.is_some() {
        confidence += WEIGHT_BALANCE;
    }

    let txn = StandardizedTransaction {
        transaction_date: date,
        posting_date: draft.posting_date,
        description,
        transaction_type: draft.transaction_type,
        reference_number: draft.reference_number,
        debit,
        credit,
        balance: draft.balance.unwrap_or_default(),
        branch_code: draft.branch_code,
        additional_info: draft.additional_info,
        bank_name: header.bank_name.clone(),
        account_number: header.account_number.clone(),
        account_holder: header.account_holder.clone(),
        source_page: page,
        extraction_confidence: confidence,
    };

    Ok(ParsedRow {
        txn,
        confidence,
        page,
        row_index,
        raw_cells: raw_cells.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn header_row_is_filtered() {
        assert!(is_non_transaction_row(&cells(&[
            "TANGGAL TRANSAKSI",
            "KETERANGAN",
            "CABANG",
            "JUMLAH",
            "DB/CR",
            "SALDO"
        ])));
    }

    #[test]
    fn summary_and_empty_rows_are_filtered() {
        assert!(is_non_transaction_row(&cells(&["SALDO AWAL", "", "10.000.000,00"])));
        assert!(is_non_transaction_row(&cells(&["BERSAMBUNG KE HALAMAN 2"])));
        assert!(is_non_transaction_row(&cells(&["", "", ""])));
    }

    #[test]
    fn dated_row_mentioning_a_token_is_kept() {
        assert!(!is_non_transaction_row(&cells(&[
            "03/01/2024",
            "PEMBELIAN KARTU DEBIT",
            "0000",
            "100.000,00",
            "DB",
            "14.885.000,00"
        ])));
        assert!(!is_non_transaction_row(&cells(&[
            "04/01/2024",
            "BIAYA KARTU KREDIT",
            "0000",
            "50.000,00",
            "DB",
            "14.835.000,00"
        ])));
    }

    #[test]
    fn token_inside_an_undated_description_does_not_filter() {
        // Carried-date row: no date cell, but the description only contains
        // a token mid-string rather than starting with one.
        assert!(!is_non_transaction_row(&cells(&[
            "",
            "PEMBELIAN KARTU DEBIT",
            "0000",
            "100.000,00",
            "DB",
            "14.885.000,00"
        ])));
    }
}

/// Shared page-parse loop: walks the page's rows, skips header/summary rows,
/// and applies the adapter's column mapping to the rest.
pub(crate) fn parse_page_rows<F>(page: &OcrPage, header: &StatementHeader, map_row: F) -> PageParse
where
    F: Fn(&[String]) -> Result<RowDraft, String>,
{
    let mut parse = PageParse::default();
    let mut last_date: Option<NaiveDate> = None;

    for (row_index, row) in page.rows().enumerate() {
        if is_non_transaction_row(&row.cells) {
            continue;
        }
        match map_row(&row.cells) {
            Ok(draft) => {
                match build_row(draft, header, page.number, row_index, &row.cells, &mut last_date)
                {
                    Ok(parsed) => parse.rows.push(parsed),
                    Err(failure) => parse.failures.push(failure),
                }
            }
            Err(reason) => parse.failures.push(RowFailure {
                page: page.number,
                row_index,
                reason,
                raw_cells: row.cells.clone(),
            }),
        }
    }

    parse
}
