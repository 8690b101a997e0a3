//! BCA passbook/Tahapan layout (first generation).
//!
//! Five columns: Tanggal (day/month only, year from the period header),
//! Keterangan, CBG, Mutasi, Saldo. The Mutasi cell carries the amount and an
//! optional trailing DB marker in one string; credits are unmarked.

use super::{
    find_after_label, keyword_score, non_empty, opening_balance, parse_page_rows, period_year,
    BankAdapter, RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric};

const KEYWORDS: &[(&str, u32)] = &[
    ("BANK CENTRAL ASIA", 2),
    ("TAHAPAN", 1),
    ("CBG", 1),
    ("MUTASI", 1),
];
const THRESHOLD: u32 = 3;

#[derive(Debug)]
pub struct BcaAdapter;

impl BcaAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BcaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for BcaAdapter {
    fn bank_name(&self) -> &'static str {
        "Bank Central Asia"
    }

    fn bank_code(&self) -> &'static str {
        "bca"
    }

    fn detect(&self, full_text: &str) -> bool {
        keyword_score(full_text, KEYWORDS) >= THRESHOLD
    }

    fn statement_header(&self, ocr: &OcrResult) -> StatementHeader {
        StatementHeader {
            bank_name: self.bank_name().to_string(),
            bank_code: self.bank_code().to_string(),
            account_number: find_after_label(&ocr.full_text, &["NO. REKENING", "NOMOR REKENING"])
                .unwrap_or_default(),
            account_holder: find_after_label(&ocr.full_text, &["NAMA", "ATAS NAMA"])
                .unwrap_or_default(),
            opening_balance: opening_balance(&ocr.full_text),
            period_year: period_year(&ocr.full_text),
        }
    }

    fn parse_page(&self, page: &OcrPage, header: &StatementHeader) -> PageParse {
        parse_page_rows(page, header, |cells| {
            if cells.len() < 5 {
                return Err(format!("expected 5 columns, got {}", cells.len()));
            }

            let (debit, credit) = split_mutasi(&cells[3]);

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                description: cells[1].clone(),
                branch_code: non_empty(&cells[2]),
                debit,
                credit,
                balance: numeric::parse_amount(&cells[4]),
                ..Default::default()
            })
        })
    }
}

/// "500.000,00 DB" is a debit; a bare amount is a credit.
fn split_mutasi(
    cell: &str,
) -> (
    Option<rust_decimal::Decimal>,
    Option<rust_decimal::Decimal>,
) {
    let trimmed = cell.trim();
    if let Some(stripped) = trimmed
        .strip_suffix("DB")
        .or_else(|| trimmed.strip_suffix("db"))
    {
        (numeric::parse_amount(stripped), None)
    } else {
        (None, numeric::parse_amount(trimmed))
    }
}
