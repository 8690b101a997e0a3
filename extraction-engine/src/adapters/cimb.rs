//! CIMB Niaga layout: four columns with no direction flag at all.
//!
//! Tanggal, Keterangan, Jumlah, Saldo. Direction is inferred from the
//! description via [`DirectionHints`] — a documented, overridable heuristic
//! that defaults to credit when no keyword matches.

use super::direction::DirectionHints;
use super::{
    find_after_label, keyword_score, opening_balance, parse_page_rows, period_year, BankAdapter,
    RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::models::Direction;
use engine_core::utils::{dates, numeric};

const KEYWORDS: &[(&str, u32)] = &[("CIMB NIAGA", 3), ("JUMLAH", 1), ("KETERANGAN", 1)];
const THRESHOLD: u32 = 4;

#[derive(Debug)]
pub struct CimbNiagaAdapter {
    hints: DirectionHints,
}

impl CimbNiagaAdapter {
    pub fn new() -> Self {
        Self {
            hints: DirectionHints::default(),
        }
    }

    /// Swap in a different keyword strategy, e.g. tuned for a corporate
    /// account's vocabulary.
    pub fn with_hints(hints: DirectionHints) -> Self {
        Self { hints }
    }
}

impl Default for CimbNiagaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for CimbNiagaAdapter {
    fn bank_name(&self) -> &'static str {
        "CIMB Niaga"
    }

    fn bank_code(&self) -> &'static str {
        "cimb_niaga"
    }

    fn detect(&self, full_text: &str) -> bool {
        keyword_score(full_text, KEYWORDS) >= THRESHOLD
    }

    fn statement_header(&self, ocr: &OcrResult) -> StatementHeader {
        StatementHeader {
            bank_name: self.bank_name().to_string(),
            bank_code: self.bank_code().to_string(),
            account_number: find_after_label(&ocr.full_text, &["NOMOR REKENING", "NO. REKENING"])
                .unwrap_or_default(),
            account_holder: find_after_label(&ocr.full_text, &["NAMA", "ATAS NAMA"])
                .unwrap_or_default(),
            opening_balance: opening_balance(&ocr.full_text),
            period_year: period_year(&ocr.full_text),
        }
    }

    fn parse_page(&self, page: &OcrPage, header: &StatementHeader) -> PageParse {
        parse_page_rows(page, header, |cells| {
            if cells.len() < 4 {
                return Err(format!("expected 4 columns, got {}", cells.len()));
            }

            let amount = numeric::parse_amount(&cells[2]);
            let (debit, credit) = match self.hints.infer(&cells[1]) {
                Direction::Debit => (amount, None),
                Direction::Credit => (None, amount),
            };

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                description: cells[1].clone(),
                debit,
                credit,
                balance: numeric::parse_amount(&cells[3]),
                ..Default::default()
            })
        })
    }
}
