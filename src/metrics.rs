//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Files currently tracked by the directory monitor.
pub static FILES_TRACKED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("codepulse_files_tracked", "Number of files tracked by the monitor")
        .expect("metric can be registered")
});

/// Monitor events emitted, by kind.
pub static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "codepulse_events_total",
        "Total number of monitor events emitted",
        &["kind"]
    )
    .expect("metric can be registered")
});

/// Analysis failures (unreadable content or analyzer panic).
pub static ANALYSIS_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "codepulse_analysis_failures_total",
        "Total number of failed file analyses"
    )
    .expect("metric can be registered")
});

/// Subscriber handlers that returned an error or panicked.
pub static SUBSCRIBER_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "codepulse_subscriber_failures_total",
        "Total number of failed subscriber dispatches"
    )
    .expect("metric can be registered")
});

/// Documents in the search index.
pub static DOCUMENTS_INDEXED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "codepulse_documents_indexed",
        "Number of documents in the search index"
    )
    .expect("metric can be registered")
});

/// Search latency histogram, by mode.
pub static SEARCH_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "codepulse_search_duration_seconds",
        "Search latency in seconds",
        &["mode"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("metric can be registered")
});

/// Analytics report generation time.
pub static REPORT_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "codepulse_report_duration_seconds",
        "Analytics report generation time in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("metric can be registered")
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*FILES_TRACKED;
    let _ = &*EVENTS_TOTAL;
    let _ = &*ANALYSIS_FAILURES;
    let _ = &*SUBSCRIBER_FAILURES;
    let _ = &*DOCUMENTS_INDEXED;
    let _ = &*SEARCH_LATENCY;
    let _ = &*REPORT_DURATION;

    tracing::debug!("Prometheus metrics initialized");
}
