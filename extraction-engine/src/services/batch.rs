//! Multi-document batch extraction over a bounded worker pool.

use crate::models::{BatchOutcome, BatchStatus, DocumentFailure, OcrResult, StatementExtraction};
use crate::services::pipeline::ExtractionPipeline;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct BatchProcessor {
    pipeline: Arc<ExtractionPipeline>,
    worker_count: usize,
    queue_size: usize,
}

impl BatchProcessor {
    pub fn new(pipeline: Arc<ExtractionPipeline>, worker_count: usize, queue_size: usize) -> Self {
        Self {
            pipeline,
            worker_count: worker_count.max(1),
            queue_size: queue_size.max(1),
        }
    }

    /// Run the batch to completion or cancellation. A cancelled batch returns
    /// every document finished before the cancellation point; documents in
    /// flight come back with their own `Cancelled` status.
    pub async fn process(
        &self,
        documents: Vec<OcrResult>,
        token: CancellationToken,
    ) -> BatchOutcome {
        let total = documents.len();
        let (tx, rx) = mpsc::channel::<OcrResult>(self.queue_size);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let extractions: Arc<Mutex<Vec<StatementExtraction>>> = Arc::new(Mutex::new(Vec::new()));
        let failures: Arc<Mutex<Vec<DocumentFailure>>> = Arc::new(Mutex::new(Vec::new()));

        // Feeder stops enqueueing as soon as the batch is cancelled.
        let feeder_token = token.clone();
        let feeder = tokio::spawn(async move {
            for doc in documents {
                tokio::select! {
                    _ = feeder_token.cancelled() => break,
                    sent = tx.send(doc) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut workers = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let pipeline = Arc::clone(&self.pipeline);
            let rx = Arc::clone(&rx);
            let extractions = Arc::clone(&extractions);
            let failures = Arc::clone(&failures);
            let token = token.clone();

            workers.push(tokio::spawn(async move {
                loop {
                    let doc = tokio::select! {
                        _ = token.cancelled() => None,
                        doc = async { rx.lock().await.recv().await } => doc,
                    };
                    let Some(ocr) = doc else { break };

                    let document_id = ocr.document_id;
                    match pipeline.extract_with_cancel(&ocr, &token).await {
                        Ok(extraction) => {
                            extractions.lock().unwrap_or_else(|e| e.into_inner()).push(extraction)
                        }
                        Err(e) => {
                            tracing::warn!(
                                worker_id,
                                document_id = %document_id,
                                error = %e,
                                "Document failed in batch extraction"
                            );
                            failures
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .push(DocumentFailure {
                                    document_id,
                                    reason: e.to_string(),
                                });
                        }
                    }
                }
            }));
        }

        let _ = feeder.await;
        for worker in workers {
            let _ = worker.await;
        }

        let status = if token.is_cancelled() {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };

        let extractions = extractions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect::<Vec<_>>();
        let failures = failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect::<Vec<_>>();

        tracing::info!(
            total,
            extracted = extractions.len(),
            failed = failures.len(),
            status = ?status,
            "Batch extraction finished"
        );

        BatchOutcome {
            extractions,
            failures,
            status,
        }
    }
}
