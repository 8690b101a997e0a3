//! BRI layout: single unsigned amount column with a separate D/C flag cell.
//!
//! Six columns: Tanggal Transaksi, Uraian, Teller, Jumlah, D/C, Saldo.

use super::{
    find_after_label, keyword_score, non_empty, opening_balance, parse_page_rows, period_year,
    BankAdapter, RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric, text};

const KEYWORDS: &[(&str, u32)] = &[
    ("BANK RAKYAT INDONESIA", 2),
    ("TELLER", 2),
    ("URAIAN", 1),
];
const THRESHOLD: u32 = 4;

#[derive(Debug)]
pub struct BriAdapter;

impl BriAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BriAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for BriAdapter {
    fn bank_name(&self) -> &'static str {
        "Bank Rakyat Indonesia"
    }

    fn bank_code(&self) -> &'static str {
        "bri"
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
            if cells.len() < 6 {
                return Err(format!("expected 6 columns, got {}", cells.len()));
            }

            let amount = numeric::parse_amount(&cells[3]);
            let (debit, credit) = match text::normalize(&cells[4]).as_str() {
                "D" | "DB" => (amount, None),
                "C" | "K" | "CR" => (None, amount),
                _ => (None, None),
            };

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                description: cells[1].clone(),
                additional_info: non_empty(&cells[2]).map(|t| format!("teller {t}")),
                debit,
                credit,
                balance: numeric::parse_amount(&cells[5]),
                ..Default::default()
            })
        })
    }
}
