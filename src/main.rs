//! codepulse - live code-quality monitor
//!
//! Entry point for the codepulse binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use codepulse::config::normalize_extension;
use codepulse::metrics::init_metrics;
use codepulse::observability::init_tracing;
use codepulse::watcher::FsContentSource;
use codepulse::{
    AnalyticsEngine, Config, DirectoryMonitor, Error, MonitorConfig, Pipeline, Result,
    SearchIndex,
};

/// codepulse - live code-quality monitor
#[derive(Parser, Debug)]
#[command(name = "codepulse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directories to monitor
    #[arg(short, long, env = "CODEPULSE_ROOTS", value_delimiter = ',', required = true)]
    root: Vec<PathBuf>,

    /// Gitignore-style patterns to ignore (replaces the defaults)
    #[arg(long, env = "CODEPULSE_IGNORE", value_delimiter = ',')]
    ignore: Vec<String>,

    /// Only monitor files with these extensions
    #[arg(long, env = "CODEPULSE_INCLUDE_EXT", value_delimiter = ',')]
    include_ext: Vec<String>,

    /// Never monitor files with these extensions
    #[arg(long, env = "CODEPULSE_EXCLUDE_EXT", value_delimiter = ',')]
    exclude_ext: Vec<String>,

    /// Maximum directory depth below a root
    #[arg(long, env = "CODEPULSE_MAX_DEPTH", default_value_t = codepulse::config::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Files larger than this many bytes are tracked but not analyzed
    #[arg(long, env = "CODEPULSE_MAX_FILE_SIZE", default_value_t = codepulse::config::DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Track files without analyzing them
    #[arg(long, env = "CODEPULSE_NO_ANALYSIS")]
    no_analysis: bool,

    /// Seconds between report summaries
    #[arg(long, env = "CODEPULSE_REPORT_INTERVAL", default_value = "30")]
    report_interval: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CODEPULSE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "CODEPULSE_LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut monitor = MonitorConfig::new(self.root);
        if !self.ignore.is_empty() {
            monitor = monitor.with_ignore_patterns(self.ignore);
        }
        monitor.include_extensions = self.include_ext.iter().map(|e| normalize_extension(e)).collect();
        monitor.exclude_extensions = self.exclude_ext.iter().map(|e| normalize_extension(e)).collect();
        monitor.max_depth = self.max_depth;
        monitor.max_file_size = self.max_file_size;
        monitor.analysis_enabled = !self.no_analysis;

        Config {
            log_level: self.log_level,
            log_json: self.log_json,
            report_interval_secs: self.report_interval,
            monitor,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!("codepulse v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli.into_config();
    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    init_metrics();

    let monitor = Arc::new(DirectoryMonitor::new(config.monitor.clone())?);
    let index = Arc::new(SearchIndex::new());
    let analytics = Arc::new(AnalyticsEngine::new());
    let (pipeline, workers) = Pipeline::spawn(
        Arc::clone(&index),
        Arc::clone(&analytics),
        Arc::new(FsContentSource),
        config.monitor.max_file_size,
    );
    let subscription = monitor.subscribe(pipeline.clone());

    // The initial scan reads every file; keep it off the async workers.
    let starter = Arc::clone(&monitor);
    tokio::task::spawn_blocking(move || starter.start())
        .await
        .map_err(|e| Error::internal(format!("monitor start task failed: {e}")))??;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.report_interval_secs));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => log_summary(&monitor, &index, &analytics),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    tracing::info!("Shutdown requested, draining");
    let stopper = Arc::clone(&monitor);
    tokio::task::spawn_blocking(move || stopper.stop())
        .await
        .map_err(|e| Error::internal(format!("monitor stop task failed: {e}")))?;
    monitor.off(subscription);
    drop(pipeline);
    workers.join().await;

    let report = analytics.generate_report();
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::internal(format!("failed to serialize report: {e}")))?;
    println!("{json}");

    Ok(())
}

fn log_summary(monitor: &DirectoryMonitor, index: &SearchIndex, analytics: &AnalyticsEngine) {
    let stats = monitor.get_stats();
    let summary = analytics.generate_report().summary;
    tracing::info!(
        files = stats.total_files,
        bytes = stats.total_size,
        events = stats.events_processed,
        errors = stats.error_count,
        documents = index.document_count(),
        average_complexity = summary.average_complexity,
        hotspots = summary.hotspot_count,
        smells = summary.smell_count,
        cycles = summary.circular_dependency_count,
        "Report summary"
    );
}
