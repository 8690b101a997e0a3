//! In-memory reconciliation projects and the matching operations over them.
//!
//! Projects live in a `DashMap` keyed by project id; each project's state sits
//! behind its own async mutex, so an auto-match pass holds exactly one
//! project exclusively while unrelated projects proceed concurrently.

use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::models::{
    AutoMatchResult, AutoMatchSummary, ConfidenceTier, InvoiceMatchStatus, ItemRejection,
    MatchScore, MatchStatus, MatchSuggestion, MatchType, ProjectTransaction, ReconciliationMatch,
    TaxInvoice,
};
use crate::services::{metrics, scoring};
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use engine_core::models::StandardizedTransaction;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

struct ProjectState {
    period_start: NaiveDate,
    period_end: NaiveDate,
    invoices: Vec<TaxInvoice>,
    transactions: Vec<ProjectTransaction>,
    matches: Vec<ReconciliationMatch>,
}

impl ProjectState {
    fn active_match_for_invoice(&self, invoice_id: Uuid) -> Option<&ReconciliationMatch> {
        self.matches
            .iter()
            .find(|m| m.invoice_id == invoice_id && m.status.is_active())
    }

    fn active_match_for_transaction(&self, transaction_id: Uuid) -> Option<&ReconciliationMatch> {
        self.matches
            .iter()
            .find(|m| m.transaction_id == transaction_id && m.status.is_active())
    }

    fn invoice(&self, invoice_id: Uuid) -> Option<&TaxInvoice> {
        self.invoices.iter().find(|i| i.invoice_id == invoice_id)
    }

    fn invoice_mut(&mut self, invoice_id: Uuid) -> Option<&mut TaxInvoice> {
        self.invoices
            .iter_mut()
            .find(|i| i.invoice_id == invoice_id)
    }

    fn transaction(&self, transaction_id: Uuid) -> Option<&ProjectTransaction> {
        self.transactions
            .iter()
            .find(|t| t.transaction_id == transaction_id)
    }

    fn unmatched_invoices(&self) -> Vec<&TaxInvoice> {
        self.invoices
            .iter()
            .filter(|i| self.active_match_for_invoice(i.invoice_id).is_none())
            .collect()
    }

    fn unmatched_transactions(&self) -> Vec<&ProjectTransaction> {
        self.transactions
            .iter()
            .filter(|t| self.active_match_for_transaction(t.transaction_id).is_none())
            .collect()
    }
}

pub struct MatchingEngine {
    projects: DashMap<Uuid, Arc<Mutex<ProjectState>>>,
    config: MatchingConfig,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            projects: DashMap::new(),
            config,
        }
    }

    pub fn create_project(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Uuid, MatchError> {
        if period_start > period_end {
            return Err(MatchError::InvalidPeriod {
                start: period_start,
                end: period_end,
            });
        }

        let project_id = Uuid::new_v4();
        self.projects.insert(
            project_id,
            Arc::new(Mutex::new(ProjectState {
                period_start,
                period_end,
                invoices: Vec::new(),
                transactions: Vec::new(),
                matches: Vec::new(),
            })),
        );

        tracing::info!(
            project_id = %project_id,
            period_start = %period_start,
            period_end = %period_end,
            "Reconciliation project created"
        );
        Ok(project_id)
    }

    fn project(&self, project_id: Uuid) -> Result<Arc<Mutex<ProjectState>>, MatchError> {
        self.projects
            .get(&project_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(MatchError::ProjectNotFound(project_id))
    }

    /// Register invoices with the project. Same per-item period rule as
    /// transactions: an invoice dated outside the project period can never
    /// enter the score matrix, so it is rejected on ingestion.
    pub async fn add_invoices(
        &self,
        project_id: Uuid,
        invoices: Vec<TaxInvoice>,
    ) -> Result<(Vec<Uuid>, Vec<ItemRejection>), MatchError> {
        let project = self.project(project_id)?;
        let mut state = project.lock().await;

        let mut accepted = Vec::new();
        let mut rejections = Vec::new();
        for (index, invoice) in invoices.into_iter().enumerate() {
            if invoice.invoice_date < state.period_start
                || invoice.invoice_date > state.period_end
            {
                rejections.push(ItemRejection {
                    index,
                    reason: format!(
                        "invoice date {} outside project period",
                        invoice.invoice_date
                    ),
                });
                continue;
            }
            accepted.push(invoice.invoice_id);
            state.invoices.push(invoice);
        }

        tracing::info!(
            project_id = %project_id,
            accepted = accepted.len(),
            rejected = rejections.len(),
            "Invoices added"
        );
        Ok((accepted, rejections))
    }

    /// Register extracted transactions with the project. Each transaction
    /// gets an engine-assigned id; rows violating debit/credit exclusivity or
    /// dated outside the project period are rejected per item, not as a
    /// whole.
    pub async fn add_transactions(
        &self,
        project_id: Uuid,
        transactions: Vec<StandardizedTransaction>,
    ) -> Result<(Vec<Uuid>, Vec<ItemRejection>), MatchError> {
        let project = self.project(project_id)?;
        let mut state = project.lock().await;

        let mut accepted = Vec::new();
        let mut rejections = Vec::new();
        for (index, txn) in transactions.into_iter().enumerate() {
            if !txn.is_exclusive() {
                rejections.push(ItemRejection {
                    index,
                    reason: "debit/credit exclusivity violated".to_string(),
                });
                continue;
            }
            if txn.transaction_date < state.period_start
                || txn.transaction_date > state.period_end
            {
                rejections.push(ItemRejection {
                    index,
                    reason: format!(
                        "transaction date {} outside project period",
                        txn.transaction_date
                    ),
                });
                continue;
            }

            let transaction_id = Uuid::new_v4();
            state.transactions.push(ProjectTransaction {
                transaction_id,
                txn,
            });
            accepted.push(transaction_id);
        }

        tracing::info!(
            project_id = %project_id,
            accepted = accepted.len(),
            rejected = rejections.len(),
            "Transactions added"
        );
        Ok((accepted, rejections))
    }

    /// One greedy auto-match pass: score every unmatched invoice against
    /// every unmatched transaction, walk pairs by descending score, and
    /// commit each pair whose sides are both still free and whose total meets
    /// the confidence floor. The project stays locked for the whole pass.
    pub async fn auto_match(
        &self,
        project_id: Uuid,
        min_confidence: Option<f64>,
    ) -> Result<AutoMatchResult, MatchError> {
        let started = std::time::Instant::now();
        let min_confidence = min_confidence.unwrap_or(self.config.min_confidence);

        let project = self.project(project_id)?;
        let mut state = project.lock().await;

        if state.invoices.is_empty() || state.transactions.is_empty() {
            return Err(MatchError::EmptyProject);
        }

        let invoices: Vec<TaxInvoice> =
            state.unmatched_invoices().into_iter().cloned().collect();
        let transactions: Vec<ProjectTransaction> =
            state.unmatched_transactions().into_iter().cloned().collect();

        let mut candidates: Vec<(MatchScore, usize, usize)> = Vec::new();
        for (ii, invoice) in invoices.iter().enumerate() {
            for (ti, transaction) in transactions.iter().enumerate() {
                let score = scoring::score_pair(invoice, transaction);
                if score.total_score >= min_confidence {
                    candidates.push((score, ii, ti));
                }
            }
        }

        // Descending by score; ties broken by id so the pass is
        // deterministic for identical inputs.
        candidates.sort_by(|a, b| {
            b.0.total_score
                .partial_cmp(&a.0.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| invoices[a.1].invoice_id.cmp(&invoices[b.1].invoice_id))
                .then_with(|| {
                    transactions[a.2]
                        .transaction_id
                        .cmp(&transactions[b.2].transaction_id)
                })
        });

        let mut invoice_consumed = vec![false; invoices.len()];
        let mut transaction_consumed = vec![false; transactions.len()];
        let mut committed: Vec<ReconciliationMatch> = Vec::new();

        for (score, ii, ti) in candidates {
            if invoice_consumed[ii] || transaction_consumed[ti] {
                continue;
            }
            invoice_consumed[ii] = true;
            transaction_consumed[ti] = true;

            let tier = ConfidenceTier::from_score(score.total_score);
            let record = ReconciliationMatch {
                match_id: Uuid::new_v4(),
                project_id,
                invoice_id: invoices[ii].invoice_id,
                transaction_id: transactions[ti].transaction_id,
                score,
                tier,
                match_type: MatchType::Auto,
                status: MatchStatus::Proposed,
                notes: None,
                created_utc: Utc::now(),
                confirmed_utc: None,
            };
            metrics::record_match(record.match_type.as_str(), tier.as_str());
            committed.push(record);
        }

        for record in &committed {
            if let Some(invoice) = state.invoice_mut(record.invoice_id) {
                invoice.match_status = InvoiceMatchStatus::AutoMatched;
            }
            state.matches.push(record.clone());
        }

        let high = committed
            .iter()
            .filter(|m| m.tier == ConfidenceTier::High)
            .count();
        let medium = committed
            .iter()
            .filter(|m| m.tier == ConfidenceTier::Medium)
            .count();
        let low = committed
            .iter()
            .filter(|m| m.tier == ConfidenceTier::Low)
            .count();

        let elapsed = started.elapsed();
        metrics::record_auto_match_duration(elapsed.as_secs_f64());

        let summary = AutoMatchSummary {
            matches_found: committed.len(),
            high_confidence_count: high,
            medium_confidence_count: medium,
            low_confidence_count: low,
            processing_time_ms: elapsed.as_millis() as u64,
        };

        tracing::info!(
            project_id = %project_id,
            matches_found = summary.matches_found,
            high_confidence = high,
            medium_confidence = medium,
            low_confidence = low,
            "Auto-match pass finished"
        );

        let unmatched_invoice_ids = state
            .unmatched_invoices()
            .iter()
            .map(|i| i.invoice_id)
            .collect();
        let unmatched_transaction_ids = state
            .unmatched_transactions()
            .iter()
            .map(|t| t.transaction_id)
            .collect();

        Ok(AutoMatchResult {
            summary,
            matches: committed,
            unmatched_invoice_ids,
            unmatched_transaction_ids,
        })
    }

    /// Top candidates for one invoice, scored on demand against the
    /// project's currently unmatched transactions.
    pub async fn get_suggestions(
        &self,
        project_id: Uuid,
        invoice_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<MatchSuggestion>, MatchError> {
        let project = self.project(project_id)?;
        let state = project.lock().await;

        let invoice = state
            .invoice(invoice_id)
            .ok_or(MatchError::InvoiceNotFound(invoice_id))?;

        let mut suggestions: Vec<MatchSuggestion> = state
            .unmatched_transactions()
            .into_iter()
            .map(|transaction| {
                let score = scoring::score_pair(invoice, transaction);
                MatchSuggestion {
                    transaction_id: transaction.transaction_id,
                    score,
                    tier: ConfidenceTier::from_score(score.total_score),
                }
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.score
                .total_score
                .partial_cmp(&a.score.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        suggestions.truncate(limit.unwrap_or(self.config.suggestion_limit));
        Ok(suggestions)
    }

    /// Operator-chosen pairing. Bypasses the confidence floor, but never an
    /// existing active match: conflicts surface the blocking record.
    pub async fn manual_match(
        &self,
        project_id: Uuid,
        invoice_id: Uuid,
        transaction_id: Uuid,
        notes: Option<String>,
    ) -> Result<ReconciliationMatch, MatchError> {
        let project = self.project(project_id)?;
        let mut state = project.lock().await;

        let invoice = state
            .invoice(invoice_id)
            .ok_or(MatchError::InvoiceNotFound(invoice_id))?
            .clone();
        let transaction = state
            .transaction(transaction_id)
            .ok_or(MatchError::TransactionNotFound(transaction_id))?
            .clone();

        if let Some(existing) = state
            .active_match_for_invoice(invoice_id)
            .or_else(|| state.active_match_for_transaction(transaction_id))
        {
            return Err(MatchError::Conflict {
                existing: Box::new(existing.clone()),
            });
        }

        let score = scoring::score_pair(&invoice, &transaction);
        let record = ReconciliationMatch {
            match_id: Uuid::new_v4(),
            project_id,
            invoice_id,
            transaction_id,
            score,
            tier: ConfidenceTier::from_score(score.total_score),
            match_type: MatchType::Manual,
            status: MatchStatus::Proposed,
            notes,
            created_utc: Utc::now(),
            confirmed_utc: None,
        };

        if let Some(invoice) = state.invoice_mut(invoice_id) {
            invoice.match_status = InvoiceMatchStatus::ManualMatched;
        }
        state.matches.push(record.clone());
        metrics::record_match(record.match_type.as_str(), record.tier.as_str());

        tracing::info!(
            project_id = %project_id,
            match_id = %record.match_id,
            invoice_id = %invoice_id,
            transaction_id = %transaction_id,
            "Manual match proposed"
        );
        Ok(record)
    }

    /// Proposed → confirmed. Terminal for the record; a confirmed match is
    /// only ever undone by an explicit reject.
    pub async fn confirm_match(
        &self,
        project_id: Uuid,
        match_id: Uuid,
    ) -> Result<ReconciliationMatch, MatchError> {
        let project = self.project(project_id)?;
        let mut state = project.lock().await;

        let record = state
            .matches
            .iter_mut()
            .find(|m| m.match_id == match_id)
            .ok_or(MatchError::MatchNotFound(match_id))?;

        if record.status != MatchStatus::Proposed {
            return Err(MatchError::InvalidTransition {
                from: record.status.as_str(),
                to: MatchStatus::Confirmed.as_str(),
            });
        }

        record.status = MatchStatus::Confirmed;
        record.confirmed_utc = Some(Utc::now());
        let record = record.clone();
        metrics::record_transition(MatchStatus::Confirmed.as_str());

        tracing::info!(
            project_id = %project_id,
            match_id = %match_id,
            invoice_id = %record.invoice_id,
            transaction_id = %record.transaction_id,
            "Match confirmed"
        );
        Ok(record)
    }

    /// Reject a proposed or confirmed match, releasing both sides for
    /// re-matching. Rejecting a confirmed match is legal but loud.
    pub async fn reject_match(
        &self,
        project_id: Uuid,
        match_id: Uuid,
    ) -> Result<ReconciliationMatch, MatchError> {
        let project = self.project(project_id)?;
        let mut state = project.lock().await;

        let record = state
            .matches
            .iter_mut()
            .find(|m| m.match_id == match_id)
            .ok_or(MatchError::MatchNotFound(match_id))?;

        match record.status {
            MatchStatus::Proposed => {}
            MatchStatus::Confirmed => {
                tracing::warn!(
                    project_id = %project_id,
                    match_id = %match_id,
                    "Rejecting a previously confirmed match"
                );
            }
            MatchStatus::Rejected => {
                return Err(MatchError::InvalidTransition {
                    from: record.status.as_str(),
                    to: MatchStatus::Rejected.as_str(),
                });
            }
        }

        record.status = MatchStatus::Rejected;
        let record = record.clone();
        if let Some(invoice) = state.invoice_mut(record.invoice_id) {
            invoice.match_status = InvoiceMatchStatus::Unmatched;
        }
        metrics::record_transition(MatchStatus::Rejected.as_str());

        tracing::info!(
            project_id = %project_id,
            match_id = %match_id,
            "Match rejected, both sides released"
        );
        Ok(record)
    }

    pub async fn unmatched_invoices(&self, project_id: Uuid) -> Result<Vec<TaxInvoice>, MatchError> {
        let project = self.project(project_id)?;
        let state = project.lock().await;
        Ok(state.unmatched_invoices().into_iter().cloned().collect())
    }

    pub async fn unmatched_transactions(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<ProjectTransaction>, MatchError> {
        let project = self.project(project_id)?;
        let state = project.lock().await;
        Ok(state.unmatched_transactions().into_iter().cloned().collect())
    }

    pub async fn matches(&self, project_id: Uuid) -> Result<Vec<ReconciliationMatch>, MatchError> {
        let project = self.project(project_id)?;
        let state = project.lock().await;
        Ok(state.matches.clone())
    }
}
