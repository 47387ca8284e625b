//! Structured logging and tracing configuration.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Structured logging with JSON output option
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Spans for the pipeline stages

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Initialize tracing with the given level and output format.
///
/// # Panics
///
/// Panics if a tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

/// Read tracing configuration from `CODEPULSE_LOG_LEVEL` and `CODEPULSE_LOG_JSON`.
#[must_use]
pub fn config_from_env() -> TracingConfig {
    let level = std::env::var("CODEPULSE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let json = std::env::var("CODEPULSE_LOG_JSON")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false);

    TracingConfig { level, json }
}

/// Spans for pipeline stages.
pub mod spans {
    use tracing::{debug_span, info_span, Span};

    /// Span around handling one file-system event.
    #[must_use]
    pub fn event_span(kind: &str, path: &std::path::Path) -> Span {
        debug_span!("monitor_event", kind = %kind, path = %path.display())
    }

    /// Span around one search call.
    #[must_use]
    pub fn search_span(mode: &str, text: &str) -> Span {
        debug_span!("search", mode = %mode, query = %text)
    }

    /// Span around report generation.
    #[must_use]
    pub fn report_span(files: usize) -> Span {
        info_span!("analytics_report", files)
    }
}
