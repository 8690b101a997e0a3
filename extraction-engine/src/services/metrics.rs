//! Prometheus metrics for the extraction pipeline.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

static DOCUMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "extraction_documents_total",
        "Documents processed by the extraction pipeline",
        &["bank_code", "status"]
    )
    .expect("metric can be created")
});

static FALLBACK_CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "extraction_fallback_calls_total",
        "Batched fallback extractor calls",
        &["outcome"]
    )
    .expect("metric can be created")
});

static FALLBACK_ROWS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "extraction_fallback_rows_total",
        "Rows escalated to the fallback extractor",
        &["outcome"]
    )
    .expect("metric can be created")
});

static ANOMALIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "extraction_anomalies_total",
        "Anomalies recorded on extracted statements",
        &["kind"]
    )
    .expect("metric can be created")
});

static DOCUMENT_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "extraction_document_duration_seconds",
        "Wall time to extract one document",
        &["bank_code"]
    )
    .expect("metric can be created")
});

pub fn record_document(bank_code: &str, status: &str) {
    DOCUMENTS_TOTAL.with_label_values(&[bank_code, status]).inc();
}

pub fn record_fallback_call(outcome: &str) {
    FALLBACK_CALLS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_fallback_rows(outcome: &str, count: usize) {
    FALLBACK_ROWS_TOTAL
        .with_label_values(&[outcome])
        .inc_by(count as f64);
}

pub fn record_anomaly(kind: &str) {
    ANOMALIES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_document_duration(bank_code: &str, seconds: f64) {
    DOCUMENT_DURATION_SECONDS
        .with_label_values(&[bank_code])
        .observe(seconds);
}
