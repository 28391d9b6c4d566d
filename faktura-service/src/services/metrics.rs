//! Prometheus metrics for faktura-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Webhook event counter by event kind and outcome
/// (applied, already_applied, ignored, rejected, failed).
pub static WEBHOOK_EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "faktura_webhook_events_total",
        "Total number of webhook events by kind and outcome",
        &["event", "outcome"]
    )
    .expect("Failed to register webhook_events_total")
});

/// Quote transition counter by target status and outcome.
pub static QUOTE_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "faktura_quote_transitions_total",
        "Total number of quote status transitions by target and outcome",
        &["status", "outcome"]
    )
    .expect("Failed to register quote_transitions_total")
});

/// Payment amount counter.
pub static PAYMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "faktura_payment_amount_total",
        "Total reconciled payment amount",
        &["currency"]
    )
    .expect("Failed to register payment_amount_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "faktura_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&WEBHOOK_EVENTS_TOTAL);
    Lazy::force(&QUOTE_TRANSITIONS_TOTAL);
    Lazy::force(&PAYMENT_AMOUNT_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
