//! OCBC NISP export: English headers and US-style number formatting.
//!
//! Seven columns: Transaction Date, Posting Date, Description, Reference No,
//! Debit, Credit, Balance.

use super::{
    find_after_label, keyword_score, non_empty, opening_balance, parse_page_rows, period_year,
    BankAdapter, RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric};

const KEYWORDS: &[(&str, u32)] = &[("OCBC NISP", 3), ("POSTING DATE", 2)];
const THRESHOLD: u32 = 4;

#[derive(Debug)]
pub struct OcbcNispAdapter;

impl OcbcNispAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OcbcNispAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for OcbcNispAdapter {
    fn bank_name(&self) -> &'static str {
        "OCBC NISP"
    }

    fn bank_code(&self) -> &'static str {
        "ocbc_nisp"
    }

    fn detect(&self, full_text: &str) -> bool {
        keyword_score(full_text, KEYWORDS) >= THRESHOLD
    }

    fn statement_header(&self, ocr: &OcrResult) -> StatementHeader {
        StatementHeader {
            bank_name: self.bank_name().to_string(),
            bank_code: self.bank_code().to_string(),
            account_number: find_after_label(&ocr.full_text, &["ACCOUNT NO", "ACCOUNT NUMBER"])
                .unwrap_or_default(),
            account_holder: find_after_label(&ocr.full_text, &["ACCOUNT NAME", "ACCOUNT HOLDER"])
                .unwrap_or_default(),
            opening_balance: opening_balance(&ocr.full_text),
            period_year: period_year(&ocr.full_text),
        }
    }

    fn parse_page(&self, page: &OcrPage, header: &StatementHeader) -> PageParse {
        parse_page_rows(page, header, |cells| {
            if cells.len() < 7 {
                return Err(format!("expected 7 columns, got {}", cells.len()));
            }

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                posting_date: dates::parse_statement_date(&cells[1], header.period_year),
                description: cells[2].clone(),
                reference_number: non_empty(&cells[3]),
                debit: numeric::parse_amount(&cells[4]),
                credit: numeric::parse_amount(&cells[5]),
                balance: numeric::parse_amount(&cells[6]),
                ..Default::default()
            })
        })
    }
}
