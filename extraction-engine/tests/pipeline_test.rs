mod common;

use chrono::NaiveDate;
use engine_core::error::EngineError;
use extraction_engine::adapters::BankRegistry;
use extraction_engine::models::{Anomaly, ExtractionStatus};
use extraction_engine::services::providers::MockExtractor;
use extraction_engine::services::{ExtractionPipeline, FallbackExtractor, TransactionDraft};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn pipeline_with(mock: &Arc<MockExtractor>) -> ExtractionPipeline {
    ExtractionPipeline::new(
        Arc::new(BankRegistry::standard()),
        Some(Arc::clone(mock) as Arc<dyn FallbackExtractor>),
        common::test_config(),
    )
}

fn pipeline_without_fallback() -> ExtractionPipeline {
    ExtractionPipeline::new(
        Arc::new(BankRegistry::standard()),
        None,
        common::test_config(),
    )
}

fn draft(date: (i32, u32, u32), description: &str, credit: &str, balance: &str) -> TransactionDraft {
    TransactionDraft {
        transaction_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        description: description.to_string(),
        transaction_type: None,
        reference_number: None,
        debit: "0".parse().unwrap(),
        credit: credit.parse().unwrap(),
        balance: Some(balance.parse().unwrap()),
    }
}

#[tokio::test]
async fn clean_statement_completes_without_fallback() {
    let mock = Arc::new(MockExtractor::new());
    let pipeline = pipeline_with(&mock);

    let extraction = pipeline
        .extract(&common::clean_bca_v2_document())
        .await
        .expect("extraction succeeds");

    assert_eq!(extraction.status, ExtractionStatus::Completed);
    assert_eq!(extraction.transactions.len(), 2);
    assert!(extraction.anomalies.is_empty());
    assert_eq!(mock.call_count(), 0, "confident rows must not hit fallback");

    assert_eq!(extraction.bank_code, "bca_v2");
    assert_eq!(extraction.account_number, "1234567890");
    assert_eq!(extraction.account_holder, "PT MAJU JAYA");
    for txn in &extraction.transactions {
        assert!(txn.is_exclusive());
        assert!(txn.extraction_confidence >= 0.90);
    }
}

#[tokio::test]
async fn description_mentioning_a_marker_word_is_not_dropped() {
    let mut ocr = common::clean_bca_v2_document();
    // "DEBIT" also appears in the header/summary token set; a dated,
    // chain-consistent row must survive the filter.
    ocr.pages[0].tables[0].rows.push(common::row(&[
        "03/01/2024",
        "PEMBELIAN KARTU DEBIT",
        "0000",
        "100.000,00",
        "DB",
        "14.885.000,00",
    ]));

    let mock = Arc::new(MockExtractor::new());
    let pipeline = pipeline_with(&mock);

    let extraction = pipeline.extract(&ocr).await.expect("extraction succeeds");

    assert_eq!(extraction.status, ExtractionStatus::Completed);
    assert_eq!(extraction.transactions.len(), 3);
    assert!(extraction.anomalies.is_empty());
    assert_eq!(mock.call_count(), 0);
    assert_eq!(
        extraction.transactions[2].description,
        "PEMBELIAN KARTU DEBIT"
    );
    assert_eq!(
        extraction.transactions[2].debit,
        "100000.00".parse().unwrap()
    );
}

#[tokio::test]
async fn ambiguous_row_is_resolved_by_one_batched_fallback_call() {
    let mut ocr = common::clean_bca_v2_document();
    // Unreadable DB/CR flag: rule parsing cannot set a direction.
    ocr.pages[0].tables[0].rows.push(common::row(&[
        "03/01/2024",
        "SETOR TUNAI",
        "0000",
        "1.000.000,00",
        "??",
        "15.985.000,00",
    ]));

    let mock = Arc::new(MockExtractor::new());
    mock.respond(1, 3, draft((2024, 1, 3), "SETOR TUNAI", "1000000.00", "15985000.00"));
    let pipeline = pipeline_with(&mock);

    let extraction = pipeline.extract(&ocr).await.expect("extraction succeeds");

    assert_eq!(mock.call_count(), 1, "all escalations batch into one call");
    assert_eq!(extraction.transactions.len(), 3);
    assert_eq!(extraction.status, ExtractionStatus::Completed);
    let resolved = &extraction.transactions[2];
    assert_eq!(resolved.credit, "1000000.00".parse().unwrap());
    assert!(resolved.is_exclusive());
}

#[tokio::test]
async fn unresolved_row_is_dropped_not_returned() {
    let mut ocr = common::clean_bca_v2_document();
    ocr.pages[0].tables[0].rows.push(common::row(&[
        "03/01/2024",
        "SETOR TUNAI",
        "0000",
        "1.000.000,00",
        "??",
        "15.985.000,00",
    ]));

    // Mock has no response programmed for the ambiguous row.
    let mock = Arc::new(MockExtractor::new());
    let pipeline = pipeline_with(&mock);

    let extraction = pipeline.extract(&ocr).await.expect("extraction succeeds");

    assert_eq!(extraction.status, ExtractionStatus::Partial);
    assert_eq!(extraction.transactions.len(), 2);
    assert!(extraction
        .transactions
        .iter()
        .all(|txn| txn.is_exclusive()));
    assert!(extraction
        .anomalies
        .iter()
        .any(|a| matches!(a, Anomaly::RowParseFailure { page: 1, row_index: 3, .. })));
}

#[tokio::test]
async fn fallback_outage_degrades_to_rule_based_output() {
    let mut ocr = common::clean_bca_v2_document();
    ocr.pages[0].tables[0].rows.push(common::row(&[
        "03/01/2024",
        "SETOR TUNAI",
        "0000",
        "1.000.000,00",
        "??",
        "15.985.000,00",
    ]));

    let mock = Arc::new(MockExtractor::new());
    mock.set_unavailable("connection refused");
    let pipeline = pipeline_with(&mock);

    let extraction = pipeline.extract(&ocr).await.expect("outage is not an error");

    assert_eq!(extraction.status, ExtractionStatus::Partial);
    assert_eq!(extraction.transactions.len(), 2);
    assert!(extraction
        .anomalies
        .iter()
        .any(|a| matches!(a, Anomaly::FallbackUnavailable { affected_rows: 1, .. })));
}

#[tokio::test]
async fn balance_chain_violation_is_reported_and_capped() {
    let mut ocr = common::clean_bca_v2_document();
    // Posted balance disagrees with the chain by 1.000.000.
    ocr.pages[0].tables[0].rows.push(common::row(&[
        "03/01/2024",
        "SETOR TUNAI",
        "0000",
        "1.000.000,00",
        "CR",
        "16.985.000,00",
    ]));

    let pipeline = pipeline_without_fallback();
    let extraction = pipeline.extract(&ocr).await.expect("extraction succeeds");

    assert_eq!(extraction.status, ExtractionStatus::Partial);
    assert_eq!(extraction.transactions.len(), 3);
    let violation = extraction
        .anomalies
        .iter()
        .find_map(|a| match a {
            Anomaly::BalanceChainViolation {
                first_row,
                last_row,
                expected_balance,
                actual_balance,
                ..
            } => Some((*first_row, *last_row, *expected_balance, *actual_balance)),
            _ => None,
        })
        .expect("violation reported");
    assert_eq!(violation.0, 3);
    assert_eq!(violation.1, 3);
    assert_eq!(violation.2, "15985000.00".parse().unwrap());
    assert_eq!(violation.3, "16985000.00".parse().unwrap());
    assert!(extraction.transactions[2].extraction_confidence <= 0.5);
}

#[tokio::test]
async fn balance_chain_violation_triggers_one_fallback_rerun() {
    let mut ocr = common::clean_bca_v2_document();
    ocr.pages[0].tables[0].rows.push(common::row(&[
        "03/01/2024",
        "SETOR TUNAI",
        "0000",
        "1.000.000,00",
        "CR",
        "16.985.000,00",
    ]));

    let mock = Arc::new(MockExtractor::new());
    mock.respond(1, 3, draft((2024, 1, 3), "SETOR TUNAI", "1000000.00", "15985000.00"));
    let pipeline = pipeline_with(&mock);

    let extraction = pipeline.extract(&ocr).await.expect("extraction succeeds");

    // The row parsed confidently, so the only fallback call is the
    // balance-chain re-run.
    assert_eq!(mock.call_count(), 1);
    assert_eq!(extraction.status, ExtractionStatus::Completed);
    assert!(extraction.anomalies.is_empty());
    assert_eq!(
        extraction.transactions[2].balance,
        "15985000.00".parse().unwrap()
    );
}

#[tokio::test]
async fn pages_without_transactions_are_surfaced() {
    let mut ocr = common::clean_bca_v2_document();
    ocr.pages.push(common::page(2, vec![]));

    let pipeline = pipeline_without_fallback();
    let extraction = pipeline.extract(&ocr).await.expect("extraction succeeds");

    assert_eq!(extraction.pages_info.total_pages, 2);
    assert_eq!(extraction.pages_info.pages_with_transactions, 1);
    assert_eq!(extraction.pages_info.pages_with_zero_transactions, vec![2]);
}

#[tokio::test]
async fn unknown_bank_is_an_explicit_error() {
    let ocr = common::document("LAPORAN KEUANGAN KOPERASI ANTAH BERANTAH", vec![]);
    let pipeline = pipeline_without_fallback();

    match pipeline.extract(&ocr).await {
        Err(EngineError::UnknownBank { supported }) => assert!(!supported.is_empty()),
        other => panic!("expected UnknownBank, got {other:?}"),
    }
}

#[tokio::test]
async fn manual_bank_selection_bypasses_detection() {
    let mut ocr = common::clean_bca_v2_document();
    ocr.full_text = "SCAN KUALITAS RENDAH".to_string();

    let pipeline = pipeline_without_fallback();
    assert!(pipeline.extract(&ocr).await.is_err());

    let extraction = pipeline
        .extract_with_adapter(&ocr, "bca_v2", &CancellationToken::new())
        .await
        .expect("explicit adapter works");
    assert_eq!(extraction.transactions.len(), 2);
}

#[tokio::test]
async fn cancelled_extraction_returns_partial_result() {
    let token = CancellationToken::new();
    token.cancel();

    let pipeline = pipeline_without_fallback();
    let extraction = pipeline
        .extract_with_cancel(&common::clean_bca_v2_document(), &token)
        .await
        .expect("cancellation is not an error");

    assert_eq!(extraction.status, ExtractionStatus::Cancelled);
    assert!(extraction.transactions.is_empty());
}
