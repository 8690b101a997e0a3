//! PermataBank layout: Tanggal, Keterangan, Nomor Referensi, Debit, Kredit,
//! Saldo.

use super::{
    find_after_label, keyword_score, non_empty, opening_balance, parse_page_rows, period_year,
    BankAdapter, RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric};

const KEYWORDS: &[(&str, u32)] = &[
    ("PERMATABANK", 2),
    ("BANK PERMATA", 2),
    ("NOMOR REFERENSI", 2),
];
const THRESHOLD: u32 = 4;

#[derive(Debug)]
pub struct PermataAdapter;

impl PermataAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PermataAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for PermataAdapter {
    fn bank_name(&self) -> &'static str {
        "PermataBank"
    }

    fn bank_code(&self) -> &'static str {
        "permata"
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

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                description: cells[1].clone(),
                reference_number: non_empty(&cells[2]),
                debit: numeric::parse_amount(&cells[3]),
                credit: numeric::parse_amount(&cells[4]),
                balance: numeric::parse_amount(&cells[5]),
                ..Default::default()
            })
        })
    }
}
