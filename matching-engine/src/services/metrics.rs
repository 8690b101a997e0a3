//! Prometheus metrics for the matching engine.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram, CounterVec, Histogram};

static MATCHES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "matching_matches_total",
        "Match records created, by type and confidence tier",
        &["match_type", "tier"]
    )
    .expect("metric can be created")
});

static TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "matching_transitions_total",
        "Match lifecycle transitions",
        &["to_status"]
    )
    .expect("metric can be created")
});

static AUTO_MATCH_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "matching_auto_match_duration_seconds",
        "Wall time of one auto-match pass"
    )
    .expect("metric can be created")
});

pub fn record_match(match_type: &str, tier: &str) {
    MATCHES_TOTAL.with_label_values(&[match_type, tier]).inc();
}

pub fn record_transition(to_status: &str) {
    TRANSITIONS_TOTAL.with_label_values(&[to_status]).inc();
}

pub fn record_auto_match_duration(seconds: f64) {
    AUTO_MATCH_DURATION_SECONDS.observe(seconds);
}
