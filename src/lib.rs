//! codepulse library
//!
//! Live code-quality monitoring for source trees: directory watching,
//! heuristic structural analysis, multi-mode search and rolling analytics.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analytics;
pub mod analyzer;
pub mod bounded;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod pipeline;
pub mod search;
pub mod watcher;

pub use analytics::{AnalyticsEngine, AnalyticsReport};
pub use analyzer::{FileAnalysis, FileAnalyzer, Language};
pub use config::{Config, MonitorConfig};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineWorkers};
pub use search::{SearchIndex, SearchMode, SearchQuery};
pub use watcher::{DirectoryMonitor, MonitorEvent, MonitorEventKind};
