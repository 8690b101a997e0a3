//! BNI landscape export.
//!
//! Eight columns: Tgl Trans, Uraian Transaksi, Uraian Tambahan, Tipe,
//! No. Referensi, Debet, Kredit, Saldo. The two uraian fields are halves of
//! one description and are concatenated.

use super::{
    find_after_label, keyword_score, non_empty, opening_balance, parse_page_rows, period_year,
    BankAdapter, RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric};

const KEYWORDS: &[(&str, u32)] = &[
    ("BANK NEGARA INDONESIA", 2),
    ("URAIAN TAMBAHAN", 2),
    ("TGL TRANS", 1),
];
const THRESHOLD: u32 = 4;

#[derive(Debug)]
pub struct BniAdapter;

impl BniAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BniAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for BniAdapter {
    fn bank_name(&self) -> &'static str {
        "Bank Negara Indonesia"
    }

    fn bank_code(&self) -> &'static str {
        "bni"
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
            account_holder: find_after_label(&ocr.full_text, &["NAMA NASABAH", "NAMA"])
                .unwrap_or_default(),
            opening_balance: opening_balance(&ocr.full_text),
            period_year: period_year(&ocr.full_text),
        }
    }

    fn parse_page(&self, page: &OcrPage, header: &StatementHeader) -> PageParse {
        parse_page_rows(page, header, |cells| {
            if cells.len() < 8 {
                return Err(format!("expected 8 columns, got {}", cells.len()));
            }

            let mut description = cells[1].trim().to_string();
            let extra = cells[2].trim();
            if !extra.is_empty() {
                if !description.is_empty() {
                    description.push(' ');
                }
                description.push_str(extra);
            }

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                description,
                transaction_type: non_empty(&cells[3]),
                reference_number: non_empty(&cells[4]),
                debit: numeric::parse_amount(&cells[5]),
                credit: numeric::parse_amount(&cells[6]),
                balance: numeric::parse_amount(&cells[7]),
                ..Default::default()
            })
        })
    }
}
