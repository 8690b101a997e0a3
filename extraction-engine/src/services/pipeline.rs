//! Hybrid rule-based + fallback extraction pipeline.
//!
//! Per document: detect bank → read header → rule-parse every page → escalate
//! low-confidence rows to the fallback extractor in one batched call →
//! validate the balance chain → page statistics. Degradation is per-row and
//! per-concern; the pipeline returns an error only when the bank itself
//! cannot be identified.

use crate::adapters::{BankAdapter, BankRegistry, RowDraft};
use crate::config::ExtractionConfig;
use crate::models::{
    Anomaly, ExtractionStatus, OcrResult, PageParse, PagesInfo, ParsedRow, RowFailure,
    StatementExtraction, StatementHeader,
};
use crate::services::metrics;
use crate::services::providers::{FallbackExtractor, FallbackOutcome, FallbackRequest};
use engine_core::error::EngineError;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Confidence ceiling for rows inside an unresolved balance-chain violation.
const VIOLATION_CONFIDENCE_CAP: f64 = 0.5;

pub struct ExtractionPipeline {
    registry: Arc<BankRegistry>,
    fallback: Option<Arc<dyn FallbackExtractor>>,
    config: ExtractionConfig,
}

/// What a fallback outcome should be applied to.
enum EscalationTarget {
    /// Index into the working row vec; a low-confidence rule candidate.
    Row(usize),
    /// Index into the failure vec; a row rule parsing rejected outright.
    Failure(usize),
}

/// Contiguous run of chain-inconsistent rows, by index into the working rows.
struct ViolationRange {
    start: usize,
    end: usize,
    expected_balance: Decimal,
    actual_balance: Decimal,
}

impl ExtractionPipeline {
    pub fn new(
        registry: Arc<BankRegistry>,
        fallback: Option<Arc<dyn FallbackExtractor>>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            registry,
            fallback,
            config,
        }
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    pub async fn extract(&self, ocr: &OcrResult) -> Result<StatementExtraction, EngineError> {
        self.extract_with_cancel(ocr, &CancellationToken::new())
            .await
    }

    pub async fn extract_with_cancel(
        &self,
        ocr: &OcrResult,
        token: &CancellationToken,
    ) -> Result<StatementExtraction, EngineError> {
        let adapter = self.registry.detect_bank(&ocr.full_text)?;
        self.run(ocr, adapter, token).await
    }

    /// Extract with an explicitly chosen bank, bypassing detection. Used
    /// after an `UnknownBank` error when the caller selects manually.
    pub async fn extract_with_adapter(
        &self,
        ocr: &OcrResult,
        bank_code: &str,
        token: &CancellationToken,
    ) -> Result<StatementExtraction, EngineError> {
        let adapter = self
            .registry
            .get(bank_code)
            .ok_or_else(|| EngineError::UnknownBank {
                supported: self.registry.list_supported_banks(),
            })?;
        self.run(ocr, adapter, token).await
    }

    async fn run(
        &self,
        ocr: &OcrResult,
        adapter: &dyn BankAdapter,
        token: &CancellationToken,
    ) -> Result<StatementExtraction, EngineError> {
        let started = std::time::Instant::now();
        let header = adapter.statement_header(ocr);

        // Rule parse, pages in parallel; join_all preserves page order. The
        // token is checked per page so a cancelled run stops scheduling work.
        let parses: Vec<PageParse> = join_all(ocr.pages.iter().map(|page| async {
            if token.is_cancelled() {
                PageParse::default()
            } else {
                adapter.parse_page(page, &header)
            }
        }))
        .await;

        let mut rows: Vec<ParsedRow> = Vec::new();
        let mut failures: Vec<RowFailure> = Vec::new();
        for parse in parses {
            rows.extend(parse.rows);
            failures.extend(parse.failures);
        }

        let mut anomalies: Vec<Anomaly> = Vec::new();
        let cancelled = token.is_cancelled();

        if cancelled {
            for failure in &failures {
                anomalies.push(Anomaly::RowParseFailure {
                    page: failure.page,
                    row_index: failure.row_index,
                    reason: failure.reason.clone(),
                });
            }
        } else {
            self.escalate_to_fallback(ocr, &header, &mut rows, failures, &mut anomalies)
                .await;
        }

        // The exclusivity invariant is unconditional: a row that still has
        // both or neither of debit/credit set after fallback is dropped, not
        // returned.
        rows.retain(|row| {
            if row.txn.is_exclusive() {
                true
            } else {
                anomalies.push(Anomaly::RowParseFailure {
                    page: row.page,
                    row_index: row.row_index,
                    reason: "debit/credit exclusivity could not be established".to_string(),
                });
                false
            }
        });

        rows.sort_by_key(|r| (r.page, r.row_index));

        if !cancelled {
            self.validate_balance_chain(ocr, &header, &mut rows, &mut anomalies)
                .await;
        }

        for anomaly in &anomalies {
            let kind = match anomaly {
                Anomaly::RowParseFailure { .. } => "row_parse_failure",
                Anomaly::BalanceChainViolation { .. } => "balance_chain_violation",
                Anomaly::FallbackUnavailable { .. } => "fallback_unavailable",
            };
            metrics::record_anomaly(kind);
        }

        let pages_info = build_pages_info(ocr, &rows);
        let status = if cancelled {
            ExtractionStatus::Cancelled
        } else if anomalies.is_empty() {
            ExtractionStatus::Completed
        } else {
            ExtractionStatus::Partial
        };

        metrics::record_document(&header.bank_code, status.as_str());
        metrics::record_document_duration(&header.bank_code, started.elapsed().as_secs_f64());

        tracing::info!(
            document_id = %ocr.document_id,
            bank_code = %header.bank_code,
            transactions = rows.len(),
            anomalies = anomalies.len(),
            status = status.as_str(),
            "Statement extraction finished"
        );

        Ok(StatementExtraction {
            document_id: ocr.document_id,
            bank_name: header.bank_name,
            bank_code: header.bank_code,
            account_number: header.account_number,
            account_holder: header.account_holder,
            transactions: rows.into_iter().map(|r| r.txn).collect(),
            anomalies,
            pages_info,
            status,
        })
    }

    /// One batched fallback call for everything rule parsing could not
    /// confidently handle. Provider failure degrades to rule-based output.
    async fn escalate_to_fallback(
        &self,
        ocr: &OcrResult,
        header: &StatementHeader,
        rows: &mut Vec<ParsedRow>,
        failures: Vec<RowFailure>,
        anomalies: &mut Vec<Anomaly>,
    ) {
        let mut requests: Vec<FallbackRequest> = Vec::new();
        let mut targets: Vec<EscalationTarget> = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            if row.confidence < self.config.accept_threshold || !row.txn.is_exclusive() {
                requests.push(self.fallback_request(ocr, row.page, row.row_index, &row.raw_cells));
                targets.push(EscalationTarget::Row(i));
            }
        }
        for (i, failure) in failures.iter().enumerate() {
            requests.push(self.fallback_request(
                ocr,
                failure.page,
                failure.row_index,
                &failure.raw_cells,
            ));
            targets.push(EscalationTarget::Failure(i));
        }

        if requests.is_empty() {
            return;
        }

        let outcomes = match &self.fallback {
            Some(provider) => match provider.extract_rows(&requests).await {
                Ok(outcomes) => {
                    metrics::record_fallback_call("ok");
                    Some(outcomes)
                }
                Err(e) => {
                    tracing::warn!(
                        document_id = %ocr.document_id,
                        affected_rows = requests.len(),
                        error = %e,
                        "Fallback extractor unavailable, keeping rule-based rows"
                    );
                    metrics::record_fallback_call("error");
                    anomalies.push(Anomaly::FallbackUnavailable {
                        affected_rows: requests.len(),
                        reason: e.to_string(),
                    });
                    None
                }
            },
            None => {
                anomalies.push(Anomaly::FallbackUnavailable {
                    affected_rows: requests.len(),
                    reason: "no fallback extractor configured".to_string(),
                });
                None
            }
        };

        let Some(outcomes) = outcomes else {
            // Rule candidates stay as-is at their rule confidence; rows that
            // never produced a candidate are reported and skipped.
            for failure in &failures {
                anomalies.push(Anomaly::RowParseFailure {
                    page: failure.page,
                    row_index: failure.row_index,
                    reason: failure.reason.clone(),
                });
            }
            return;
        };

        let mut extracted = 0usize;
        let mut failed = 0usize;
        for (target, outcome) in targets.iter().zip(outcomes) {
            match (target, outcome) {
                (EscalationTarget::Row(i), FallbackOutcome::Extracted(draft)) => {
                    let row = &rows[*i];
                    if let Ok(rebuilt) =
                        draft_to_row(&draft, header, row.page, row.row_index, &row.raw_cells)
                    {
                        rows[*i] = rebuilt;
                        extracted += 1;
                    }
                }
                (EscalationTarget::Row(_), FallbackOutcome::Failed { .. }) => {
                    // The rule candidate survives at its own confidence.
                    failed += 1;
                }
                (EscalationTarget::Failure(i), FallbackOutcome::Extracted(draft)) => {
                    let failure = &failures[*i];
                    if let Ok(built) = draft_to_row(
                        &draft,
                        header,
                        failure.page,
                        failure.row_index,
                        &failure.raw_cells,
                    ) {
                        rows.push(built);
                        extracted += 1;
                    }
                }
                (EscalationTarget::Failure(i), FallbackOutcome::Failed { reason }) => {
                    let failure = &failures[*i];
                    anomalies.push(Anomaly::RowParseFailure {
                        page: failure.page,
                        row_index: failure.row_index,
                        reason,
                    });
                    failed += 1;
                }
            }
        }
        metrics::record_fallback_rows("extracted", extracted);
        metrics::record_fallback_rows("failed", failed);
    }

    /// Strictly sequential balance-chain validation with one fallback re-run
    /// for the offending sub-ranges before anomalies are surfaced.
    async fn validate_balance_chain(
        &self,
        ocr: &OcrResult,
        header: &StatementHeader,
        rows: &mut [ParsedRow],
        anomalies: &mut Vec<Anomaly>,
    ) {
        let tolerance = self.config.balance_tolerance;
        let mut ranges = violation_ranges(rows, header.opening_balance, tolerance);
        if ranges.is_empty() {
            return;
        }

        let fallback_reachable = self.fallback.is_some()
            && !anomalies
                .iter()
                .any(|a| matches!(a, Anomaly::FallbackUnavailable { .. }));

        if fallback_reachable {
            let indices: Vec<usize> = ranges
                .iter()
                .flat_map(|r| r.start..=r.end)
                .collect();
            let requests: Vec<FallbackRequest> = indices
                .iter()
                .map(|&i| {
                    self.fallback_request(ocr, rows[i].page, rows[i].row_index, &rows[i].raw_cells)
                })
                .collect();

            // Re-run failures are not anomalies here; the violation itself
            // gets reported below if it persists.
            if let Some(provider) = &self.fallback {
                match provider.extract_rows(&requests).await {
                    Ok(outcomes) => {
                        metrics::record_fallback_call("ok");
                        for (&i, outcome) in indices.iter().zip(outcomes) {
                            if let FallbackOutcome::Extracted(draft) = outcome {
                                if let Ok(rebuilt) = draft_to_row(
                                    &draft,
                                    header,
                                    rows[i].page,
                                    rows[i].row_index,
                                    &rows[i].raw_cells,
                                ) {
                                    if rebuilt.txn.is_exclusive() {
                                        rows[i] = rebuilt;
                                    }
                                }
                            }
                        }
                        ranges = violation_ranges(rows, header.opening_balance, tolerance);
                    }
                    Err(e) => {
                        metrics::record_fallback_call("error");
                        tracing::warn!(
                            document_id = %ocr.document_id,
                            error = %e,
                            "Fallback re-run for balance-chain violations failed"
                        );
                    }
                }
            }
        }

        for range in ranges {
            for row in rows[range.start..=range.end].iter_mut() {
                row.confidence = row.confidence.min(VIOLATION_CONFIDENCE_CAP);
                row.txn.extraction_confidence =
                    row.txn.extraction_confidence.min(VIOLATION_CONFIDENCE_CAP);
            }
            tracing::warn!(
                document_id = %ocr.document_id,
                page = rows[range.start].page,
                first_row = rows[range.start].row_index,
                last_row = rows[range.end].row_index,
                expected = %range.expected_balance,
                actual = %range.actual_balance,
                "Balance chain violation"
            );
            anomalies.push(Anomaly::BalanceChainViolation {
                page: rows[range.start].page,
                first_row: rows[range.start].row_index,
                last_row: rows[range.end].row_index,
                expected_balance: range.expected_balance,
                actual_balance: range.actual_balance,
            });
        }
    }

    fn fallback_request(
        &self,
        ocr: &OcrResult,
        page: u32,
        row_index: usize,
        raw_cells: &[String],
    ) -> FallbackRequest {
        let context = self.config.fallback_context_rows;
        let page_rows: Vec<String> = ocr
            .pages
            .iter()
            .find(|p| p.number == page)
            .map(|p| p.rows().map(|r| r.cells.join(" | ")).collect())
            .unwrap_or_default();

        let context_before = page_rows[..row_index.min(page_rows.len())]
            .iter()
            .rev()
            .take(context)
            .rev()
            .cloned()
            .collect();
        let context_after = page_rows
            .iter()
            .skip(row_index + 1)
            .take(context)
            .cloned()
            .collect();

        FallbackRequest {
            page,
            row_index,
            raw_cells: raw_cells.to_vec(),
            context_before,
            context_after,
        }
    }
}

/// Rebuild a row from a fallback draft, scored with the same field weights as
/// rule-parsed rows.
fn draft_to_row(
    draft: &crate::services::providers::TransactionDraft,
    header: &StatementHeader,
    page: u32,
    row_index: usize,
    raw_cells: &[String],
) -> Result<ParsedRow, RowFailure> {
    let mut last_date = Some(draft.transaction_date);
    crate::adapters::build_row(
        RowDraft {
            transaction_date: Some(draft.transaction_date),
            description: draft.description.clone(),
            transaction_type: draft.transaction_type.clone(),
            reference_number: draft.reference_number.clone(),
            debit: Some(draft.debit),
            credit: Some(draft.credit),
            balance: draft.balance,
            ..Default::default()
        },
        header,
        page,
        row_index,
        raw_cells,
        &mut last_date,
    )
}

/// Walk the ordered rows and group chain-inconsistent rows into contiguous
/// ranges, recording the first mismatch of each range.
fn violation_ranges(
    rows: &[ParsedRow],
    opening_balance: Option<Decimal>,
    tolerance: Decimal,
) -> Vec<ViolationRange> {
    let mut previous = match opening_balance {
        Some(opening) => opening,
        None => match rows.first() {
            Some(first) => first.txn.balance + first.txn.debit - first.txn.credit,
            None => return Vec::new(),
        },
    };

    let mut ranges: Vec<ViolationRange> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if !row.txn.follows_balance(previous, tolerance) {
            let expected = previous - row.txn.debit + row.txn.credit;
            match ranges.last_mut() {
                Some(last) if last.end + 1 == i => last.end = i,
                _ => ranges.push(ViolationRange {
                    start: i,
                    end: i,
                    expected_balance: expected,
                    actual_balance: row.txn.balance,
                }),
            }
        }
        previous = row.txn.balance;
    }
    ranges
}

fn build_pages_info(ocr: &OcrResult, rows: &[ParsedRow]) -> PagesInfo {
    let mut transactions_per_page: Vec<(u32, usize)> =
        ocr.pages.iter().map(|p| (p.number, 0)).collect();
    for row in rows {
        if let Some(entry) = transactions_per_page.iter_mut().find(|(n, _)| *n == row.page) {
            entry.1 += 1;
        }
    }

    let pages_with_zero_transactions: Vec<u32> = transactions_per_page
        .iter()
        .filter(|(_, count)| *count == 0)
        .map(|(n, _)| *n)
        .collect();

    PagesInfo {
        total_pages: ocr.pages.len() as u32,
        pages_with_transactions: (transactions_per_page.len() - pages_with_zero_transactions.len())
            as u32,
        transactions_per_page,
        pages_with_zero_transactions,
    }
}
