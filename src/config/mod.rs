//! Configuration management for codepulse.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables (`CODEPULSE_*`)
//! - Built-in defaults

mod monitor;
mod settings;

pub use monitor::{
    normalize_extension, MonitorConfig, DEFAULT_DEBOUNCE, DEFAULT_IGNORE_PATTERNS,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_FILE_SIZE,
};
pub use settings::Config;
