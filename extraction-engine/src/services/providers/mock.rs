//! In-process fallback extractor for tests.

use super::{FallbackExtractor, FallbackOutcome, FallbackRequest, ProviderError, TransactionDraft};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Preprogrammed extractor keyed by `(page, row_index)`. Rows with no
/// programmed response come back as `Failed`. Tracks call counts so tests can
/// assert batching behaviour (one call per document, not per row).
#[derive(Default)]
pub struct MockExtractor {
    responses: Mutex<HashMap<(u32, usize), TransactionDraft>>,
    unavailable: Mutex<Option<String>>,
    calls: AtomicUsize,
    rows_requested: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program the draft returned for one row.
    pub fn respond(&self, page: u32, row_index: usize, draft: TransactionDraft) {
        self.responses
            .lock()
            .unwrap()
            .insert((page, row_index), draft);
    }

    /// Make every subsequent call fail with a network error.
    pub fn set_unavailable(&self, reason: &str) {
        *self.unavailable.lock().unwrap() = Some(reason.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rows_requested(&self) -> usize {
        self.rows_requested.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackExtractor for MockExtractor {
    async fn extract_rows(
        &self,
        requests: &[FallbackRequest],
    ) -> Result<Vec<FallbackOutcome>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows_requested.fetch_add(requests.len(), Ordering::SeqCst);

        if let Some(reason) = self.unavailable.lock().unwrap().clone() {
            return Err(ProviderError::NetworkError(reason));
        }

        let responses = self.responses.lock().unwrap();
        Ok(requests
            .iter()
            .map(|req| match responses.get(&(req.page, req.row_index)) {
                Some(draft) => FallbackOutcome::Extracted(draft.clone()),
                None => FallbackOutcome::Failed {
                    reason: "no programmed response".to_string(),
                },
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.unavailable.lock().unwrap().clone() {
            Some(reason) => Err(ProviderError::NetworkError(reason)),
            None => Ok(()),
        }
    }
}
