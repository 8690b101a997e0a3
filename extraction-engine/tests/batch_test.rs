mod common;

use extraction_engine::adapters::BankRegistry;
use extraction_engine::models::BatchStatus;
use extraction_engine::services::{BatchProcessor, ExtractionPipeline};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn processor() -> BatchProcessor {
    let pipeline = Arc::new(ExtractionPipeline::new(
        Arc::new(BankRegistry::standard()),
        None,
        common::test_config(),
    ));
    BatchProcessor::new(pipeline, 2, 8)
}

#[tokio::test]
async fn batch_extracts_documents_and_isolates_failures() {
    let good_one = common::clean_bca_v2_document();
    let good_two = common::clean_bca_v2_document();
    let unknown = common::document("LAPORAN KEUANGAN KOPERASI ANTAH BERANTAH", vec![]);
    let unknown_id = unknown.document_id;

    let outcome = processor()
        .process(vec![good_one, unknown, good_two], CancellationToken::new())
        .await;

    assert_eq!(outcome.status, BatchStatus::Completed);
    assert_eq!(outcome.extractions.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].document_id, unknown_id);
}

#[tokio::test]
async fn cancelled_batch_returns_partial_results() {
    let token = CancellationToken::new();
    token.cancel();

    let documents = (0..4).map(|_| common::clean_bca_v2_document()).collect();
    let outcome = processor().process(documents, token).await;

    assert_eq!(outcome.status, BatchStatus::Cancelled);
    assert!(outcome.extractions.len() <= 4);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn empty_batch_completes() {
    let outcome = processor()
        .process(Vec::new(), CancellationToken::new())
        .await;
    assert_eq!(outcome.status, BatchStatus::Completed);
    assert!(outcome.extractions.is_empty());
    assert!(outcome.failures.is_empty());
}
