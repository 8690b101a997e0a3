//! Shared fixtures for extraction integration tests.

use extraction_engine::config::ExtractionConfig;
use extraction_engine::models::{OcrPage, OcrResult, OcrRow, OcrTable};
use uuid::Uuid;

pub const BCA_V2_FULL_TEXT: &str = "\
PT BANK CENTRAL ASIA Tbk
REKENING TAHAPAN GOLD
NO. REKENING : 1234567890
NAMA : PT MAJU JAYA
PERIODE : JANUARI 2024
SALDO AWAL : 10.000.000,00
TANGGAL TRANSAKSI KETERANGAN CABANG JUMLAH DB/CR SALDO
";

pub const BCA_V1_FULL_TEXT: &str = "\
PT BANK CENTRAL ASIA Tbk
TAHAPAN
NO. REKENING : 1234567890
NAMA : PT MAJU JAYA
PERIODE : JANUARI 2024
SALDO AWAL : 10.000.000,00
TANGGAL KETERANGAN CBG MUTASI SALDO
";

pub fn row(cells: &[&str]) -> OcrRow {
    OcrRow {
        cells: cells.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn page(number: u32, rows: Vec<OcrRow>) -> OcrPage {
    OcrPage {
        number,
        text: String::new(),
        tables: vec![OcrTable { rows }],
    }
}

pub fn document(full_text: &str, pages: Vec<OcrPage>) -> OcrResult {
    OcrResult {
        document_id: Uuid::new_v4(),
        full_text: full_text.to_string(),
        pages,
    }
}

/// One-page BCA V2 statement whose rows all parse at full confidence and
/// whose balance chain is consistent with the 10.000.000,00 opening balance.
pub fn clean_bca_v2_document() -> OcrResult {
    document(
        BCA_V2_FULL_TEXT,
        vec![page(
            1,
            vec![
                row(&["TANGGAL TRANSAKSI", "KETERANGAN", "CABANG", "JUMLAH", "DB/CR", "SALDO"]),
                row(&[
                    "01/01/2024",
                    "TRF MASUK DARI PT SUMBER",
                    "0000",
                    "5.000.000,00",
                    "CR",
                    "15.000.000,00",
                ]),
                row(&[
                    "02/01/2024",
                    "BIAYA ADM",
                    "0000",
                    "15.000,00",
                    "DB",
                    "14.985.000,00",
                ]),
            ],
        )],
    )
}

pub fn test_config() -> ExtractionConfig {
    ExtractionConfig::default()
}
