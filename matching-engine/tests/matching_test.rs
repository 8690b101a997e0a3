use chrono::NaiveDate;
use engine_core::models::StandardizedTransaction;
use matching_engine::config::MatchingConfig;
use matching_engine::models::{ConfidenceTier, InvoiceMatchStatus, MatchStatus, TaxInvoice};
use matching_engine::{MatchError, MatchingEngine};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn invoice(total: &str, invoice_date: NaiveDate, vendor: &str, number: &str) -> TaxInvoice {
    TaxInvoice {
        invoice_id: Uuid::new_v4(),
        invoice_number: number.to_string(),
        invoice_date,
        vendor_name: vendor.to_string(),
        vendor_npwp: Some("01.234.567.8-901.000".to_string()),
        dpp: "10000000".parse().unwrap(),
        ppn: "1100000".parse().unwrap(),
        total_amount: total.parse().unwrap(),
        match_status: InvoiceMatchStatus::Unmatched,
    }
}

fn transaction(debit: &str, txn_date: NaiveDate, description: &str) -> StandardizedTransaction {
    StandardizedTransaction {
        transaction_date: txn_date,
        posting_date: None,
        description: description.to_string(),
        transaction_type: None,
        reference_number: None,
        debit: debit.parse().unwrap(),
        credit: "0".parse().unwrap(),
        balance: "0".parse().unwrap(),
        branch_code: None,
        additional_info: None,
        bank_name: "Bank Central Asia".to_string(),
        account_number: "1234567890".to_string(),
        account_holder: "PT MAJU JAYA".to_string(),
        source_page: 1,
        extraction_confidence: 1.0,
    }
}

fn engine() -> MatchingEngine {
    MatchingEngine::new(MatchingConfig::default())
}

async fn project_with(
    engine: &MatchingEngine,
    invoices: Vec<TaxInvoice>,
    transactions: Vec<StandardizedTransaction>,
) -> Uuid {
    let project_id = engine
        .create_project(date(2024, 1, 1), date(2024, 1, 31))
        .expect("valid period");
    engine
        .add_invoices(project_id, invoices)
        .await
        .expect("invoices added");
    engine
        .add_transactions(project_id, transactions)
        .await
        .expect("transactions added");
    project_id
}

#[test]
fn inverted_period_is_rejected() {
    let err = engine()
        .create_project(date(2024, 2, 1), date(2024, 1, 1))
        .expect_err("inverted period");
    assert!(matches!(err, MatchError::InvalidPeriod { .. }));
}

#[tokio::test]
async fn bad_transactions_are_rejected_per_item() {
    let engine = engine();
    let project_id = engine
        .create_project(date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();

    let mut non_exclusive = transaction("100000", date(2024, 1, 10), "X");
    non_exclusive.credit = "100000".parse().unwrap();
    let out_of_period = transaction("100000", date(2024, 3, 10), "X");
    let good = transaction("100000", date(2024, 1, 10), "X");

    let (accepted, rejections) = engine
        .add_transactions(project_id, vec![non_exclusive, out_of_period, good])
        .await
        .expect("project exists");

    assert_eq!(accepted.len(), 1);
    assert_eq!(rejections.len(), 2);
    assert_eq!(rejections[0].index, 0);
    assert_eq!(rejections[1].index, 1);
}

#[tokio::test]
async fn out_of_period_invoices_are_rejected_per_item() {
    let engine = engine();
    let project_id = engine
        .create_project(date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();

    let out_of_period = invoice("5000000", date(2024, 3, 10), "PT ABC", "INV-1");
    let in_period = invoice("5000000", date(2024, 1, 10), "PT ABC", "INV-2");
    let in_period_id = in_period.invoice_id;

    let (accepted, rejections) = engine
        .add_invoices(project_id, vec![out_of_period, in_period])
        .await
        .expect("project exists");

    assert_eq!(accepted, vec![in_period_id]);
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].index, 0);
    assert_eq!(engine.unmatched_invoices(project_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn auto_match_commits_strong_pair_as_high_confidence() {
    let engine = engine();
    let inv = invoice(
        "11100000",
        date(2024, 1, 10),
        "PT ABC Corp",
        "INV-2024-001",
    );
    let invoice_id = inv.invoice_id;
    let project_id = project_with(
        &engine,
        vec![inv],
        vec![transaction(
            "11100000",
            date(2024, 1, 10),
            "PEMBAYARAN PT ABC CORP INV-2024-001",
        )],
    )
    .await;

    let result = engine.auto_match(project_id, None).await.expect("pass runs");

    assert_eq!(result.summary.matches_found, 1);
    assert_eq!(result.summary.high_confidence_count, 1);
    let record = &result.matches[0];
    assert_eq!(record.invoice_id, invoice_id);
    assert_eq!(record.tier, ConfidenceTier::High);
    assert_eq!(record.status, MatchStatus::Proposed);
    assert!(record.score.total_score >= 0.90);
    assert!(result.unmatched_invoice_ids.is_empty());
    assert!(result.unmatched_transaction_ids.is_empty());
}

#[tokio::test]
async fn auto_match_never_double_books_either_side() {
    let engine = engine();
    // Two invoices for the same amount and day compete for one transaction.
    let inv_a = invoice("5000000", date(2024, 1, 10), "PT ABC Corp", "INV-A");
    let inv_b = invoice("5000000", date(2024, 1, 10), "PT ABC Corp", "INV-B");
    let project_id = project_with(
        &engine,
        vec![inv_a, inv_b],
        vec![transaction(
            "5000000",
            date(2024, 1, 10),
            "PEMBAYARAN PT ABC CORP",
        )],
    )
    .await;

    let result = engine.auto_match(project_id, None).await.expect("pass runs");

    assert_eq!(result.summary.matches_found, 1);
    assert_eq!(result.unmatched_invoice_ids.len(), 1);
    assert!(result.unmatched_transaction_ids.is_empty());
}

#[tokio::test]
async fn auto_match_respects_confidence_floor() {
    let engine = engine();
    let project_id = project_with(
        &engine,
        vec![invoice(
            "5000000",
            date(2024, 1, 10),
            "PT Sumber Rejeki",
            "INV-7",
        )],
        // Wrong amount, distant date, unrelated description.
        vec![transaction("9000000", date(2024, 1, 28), "TRF LAIN")],
    )
    .await;

    let result = engine.auto_match(project_id, None).await.expect("pass runs");

    assert_eq!(result.summary.matches_found, 0);
    assert_eq!(result.unmatched_invoice_ids.len(), 1);
    assert_eq!(result.unmatched_transaction_ids.len(), 1);
}

#[tokio::test]
async fn auto_match_requires_both_sides() {
    let engine = engine();
    let project_id = engine
        .create_project(date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();
    engine
        .add_invoices(
            project_id,
            vec![invoice("5000000", date(2024, 1, 10), "PT ABC", "INV-1")],
        )
        .await
        .unwrap();

    let err = engine
        .auto_match(project_id, None)
        .await
        .expect_err("no transactions");
    assert!(matches!(err, MatchError::EmptyProject));
}

#[tokio::test]
async fn suggestions_are_sorted_and_limited() {
    let engine = engine();
    let inv = invoice("5000000", date(2024, 1, 10), "PT ABC Corp", "INV-1");
    let invoice_id = inv.invoice_id;
    let project_id = project_with(
        &engine,
        vec![inv],
        vec![
            transaction("5000000", date(2024, 1, 10), "PEMBAYARAN PT ABC CORP"),
            transaction("5010000", date(2024, 1, 13), "TRF PT ABC"),
            transaction("9000000", date(2024, 1, 28), "TRF LAIN"),
        ],
    )
    .await;

    let suggestions = engine
        .get_suggestions(project_id, invoice_id, Some(2))
        .await
        .expect("invoice exists");

    assert_eq!(suggestions.len(), 2);
    assert!(suggestions[0].score.total_score >= suggestions[1].score.total_score);
    assert_eq!(suggestions[0].tier, ConfidenceTier::High);
}

#[tokio::test]
async fn manual_match_conflicts_with_active_match() {
    let engine = engine();
    let inv_a = invoice("5000000", date(2024, 1, 10), "PT ABC Corp", "INV-A");
    let inv_b = invoice("7000000", date(2024, 1, 12), "PT XYZ", "INV-B");
    let (a_id, b_id) = (inv_a.invoice_id, inv_b.invoice_id);
    let project_id = project_with(
        &engine,
        vec![inv_a, inv_b],
        vec![transaction(
            "5000000",
            date(2024, 1, 10),
            "PEMBAYARAN PT ABC CORP",
        )],
    )
    .await;

    let txns = engine.unmatched_transactions(project_id).await.unwrap();
    let txn_id = txns[0].transaction_id;

    let first = engine
        .manual_match(project_id, a_id, txn_id, None)
        .await
        .expect("first manual match");

    let err = engine
        .manual_match(project_id, b_id, txn_id, None)
        .await
        .expect_err("transaction already held");
    match err {
        MatchError::Conflict { existing } => assert_eq!(existing.match_id, first.match_id),
        other => panic!("expected Conflict, got {other}"),
    }
}

#[tokio::test]
async fn confirm_and_reject_lifecycle() {
    let engine = engine();
    let inv = invoice("11100000", date(2024, 1, 10), "PT ABC Corp", "INV-2024-001");
    let project_id = project_with(
        &engine,
        vec![inv],
        vec![transaction(
            "11100000",
            date(2024, 1, 10),
            "PEMBAYARAN PT ABC CORP INV-2024-001",
        )],
    )
    .await;

    let result = engine.auto_match(project_id, None).await.unwrap();
    let match_id = result.matches[0].match_id;

    let confirmed = engine
        .confirm_match(project_id, match_id)
        .await
        .expect("proposed confirms");
    assert_eq!(confirmed.status, MatchStatus::Confirmed);
    assert!(confirmed.confirmed_utc.is_some());

    // Confirming twice is an invalid transition.
    let err = engine
        .confirm_match(project_id, match_id)
        .await
        .expect_err("already confirmed");
    assert!(matches!(err, MatchError::InvalidTransition { .. }));

    // Rejecting a confirmed match is allowed and frees both sides.
    let rejected = engine
        .reject_match(project_id, match_id)
        .await
        .expect("confirmed can be rejected");
    assert_eq!(rejected.status, MatchStatus::Rejected);
    assert_eq!(engine.unmatched_invoices(project_id).await.unwrap().len(), 1);
    assert_eq!(
        engine
            .unmatched_transactions(project_id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn rematch_after_reject_creates_fresh_record() {
    let engine = engine();
    let inv = invoice("11100000", date(2024, 1, 10), "PT ABC Corp", "INV-2024-001");
    let project_id = project_with(
        &engine,
        vec![inv],
        vec![transaction(
            "11100000",
            date(2024, 1, 10),
            "PEMBAYARAN PT ABC CORP INV-2024-001",
        )],
    )
    .await;

    let first = engine.auto_match(project_id, None).await.unwrap();
    let first_id = first.matches[0].match_id;
    engine.reject_match(project_id, first_id).await.unwrap();

    let second = engine.auto_match(project_id, None).await.unwrap();
    assert_eq!(second.summary.matches_found, 1);
    assert_ne!(second.matches[0].match_id, first_id);

    // The rejected record stays in the project history.
    let all = engine.matches(project_id).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|m| m.status == MatchStatus::Rejected));
    assert!(all.iter().any(|m| m.status == MatchStatus::Proposed));

    // Rejecting the already-rejected record again is invalid.
    let err = engine
        .reject_match(project_id, first_id)
        .await
        .expect_err("double reject");
    assert!(matches!(err, MatchError::InvalidTransition { .. }));
}

#[tokio::test]
async fn unknown_project_is_an_error() {
    let engine = engine();
    let err = engine
        .auto_match(Uuid::new_v4(), None)
        .await
        .expect_err("no such project");
    assert!(matches!(err, MatchError::ProjectNotFound(_)));
}
