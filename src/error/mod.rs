//! Error types and Result aliases for codepulse.
//!
//! This module defines the error hierarchy used throughout the crate.
//! Fallible public functions return `Result<T, Error>` or `Result<T>`.
//! The analytics engine never fails; malformed input is counted and skipped.

use thiserror::Error;

/// Result type alias using codepulse's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for codepulse operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Directory monitor error.
    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Search index error.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Directory monitor errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// `start()` called on a running monitor.
    #[error("monitor is already running")]
    AlreadyRunning,

    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Analysis of a file failed. Non-fatal: the event is still emitted.
    #[error("failed to analyze '{path}': {reason}")]
    AnalysisFailed { path: String, reason: String },
}

/// Search index errors.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query could not be compiled (malformed regex).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No saved query exists with the given id.
    #[error("saved query not found: '{0}'")]
    SavedQueryNotFound(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this error is a malformed query.
    #[must_use]
    pub const fn is_invalid_query(&self) -> bool {
        matches!(self, Self::Search(SearchError::InvalidQuery(_)))
    }

    /// Returns true if this error is an unknown saved query id.
    #[must_use]
    pub const fn is_saved_query_not_found(&self) -> bool {
        matches!(self, Self::Search(SearchError::SavedQueryNotFound(_)))
    }
}

impl MonitorError {
    /// Create an analysis failure for a path.
    pub fn analysis_failed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::AnalysisFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}
