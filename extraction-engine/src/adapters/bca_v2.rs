//! BCA e-statement, second-generation layout.
//!
//! Six columns: Tanggal Transaksi (full date), Keterangan, Cabang, Jumlah,
//! DB/CR flag, Saldo. The single amount column is split into debit/credit by
//! the flag cell. Shares most keywords with the first-generation layout, so
//! this adapter must be registered before [`super::BcaAdapter`].

use super::{
    find_after_label, keyword_score, non_empty, opening_balance, parse_page_rows, period_year,
    BankAdapter, RowDraft,
};
use crate::models::{OcrPage, OcrResult, PageParse, StatementHeader};
use engine_core::utils::{dates, numeric, text};

const KEYWORDS: &[(&str, u32)] = &[
    ("BANK CENTRAL ASIA", 2),
    ("TANGGAL TRANSAKSI", 2),
    ("DB/CR", 2),
];
const THRESHOLD: u32 = 5;

#[derive(Debug)]
pub struct BcaV2Adapter;

impl BcaV2Adapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BcaV2Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BankAdapter for BcaV2Adapter {
    fn bank_name(&self) -> &'static str {
        "Bank Central Asia"
    }

    fn bank_code(&self) -> &'static str {
        "bca_v2"
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
            if cells.len() < 6 {
                return Err(format!("expected 6 columns, got {}", cells.len()));
            }

            let amount = numeric::parse_amount(&cells[3]);
            let flag = text::normalize(&cells[4]);
            let (debit, credit) = match flag.as_str() {
                "DB" | "D" => (amount, None),
                "CR" | "K" | "C" => (None, amount),
                // Unreadable flag: leave both sides empty so the row fails
                // the exclusivity weight and escalates to fallback.
                _ => (None, None),
            };

            Ok(RowDraft {
                transaction_date: dates::parse_statement_date(&cells[0], header.period_year),
                description: cells[1].clone(),
                branch_code: non_empty(&cells[2]),
                debit,
                credit,
                balance: numeric::parse_amount(&cells[5]),
                ..Default::default()
            })
        })
    }
}
