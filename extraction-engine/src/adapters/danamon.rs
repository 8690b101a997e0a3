//! Bank Danamon layout: one signed amount column, debits in parentheses.
//!
//! Four columns: Tanggal, Keterangan, Jumlah, Saldo. `(250.000,00)` is a
//! debit of 250.000,00; a bare amount is a credit.

use super::{
    find_after_label, keyword_score, opening_balance, parse_page_rows, period_year, BankAdapter,
    RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric};

const KEYWORDS: &[(&str, u32)] = &[("BANK DANAMON", 3), ("JUMLAH", 1)];
const THRESHOLD: u32 = 4;

#[derive(Debug)]
pub struct DanamonAdapter;

impl DanamonAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DanamonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for DanamonAdapter {
    fn bank_name(&self) -> &'static str {
        "Bank Danamon"
    }

    fn bank_code(&self) -> &'static str {
        "danamon"
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

            let (debit, credit) = match numeric::parse_amount(&cells[2]) {
                Some(amount) if amount.is_sign_negative() => (Some(-amount), None),
                Some(amount) => (None, Some(amount)),
                None => (None, None),
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
